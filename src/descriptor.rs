//! Endpoint descriptor for the remote API, validated at build time.
//!
//! The descriptor holds the HTTPS base every relative endpoint path is joined onto
//! (`https://qyapi.weixin.qq.com/cgi-bin/` in production) and the OAuth authorize page used
//! to build member sign-in links. Tests point both at a local mock server.

// self
use crate::{_prelude::*, error::ConfigError};

/// Production API base.
pub const DEFAULT_API_BASE: &str = "https://qyapi.weixin.qq.com/cgi-bin/";
/// Production OAuth authorize page.
pub const DEFAULT_AUTHORIZE_ENDPOINT: &str = "https://open.weixin.qq.com/connect/oauth2/authorize";

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DescriptorError {
	/// An endpoint string could not be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Relative paths are joined onto the base, so it must end with `/`.
	#[error("The API base must end with a trailing slash: {url}.")]
	ApiBaseNotDirectory {
		/// Base URL that failed validation.
		url: String,
	},
	/// The API base cannot carry a query or fragment.
	#[error("The API base must not carry a query or fragment: {url}.")]
	ApiBaseHasQuery {
		/// Base URL that failed validation.
		url: String,
	},
}

/// Immutable endpoint set consumed by the transport, supplier, and endpoint builders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDescriptor {
	/// Base URL relative endpoint paths are joined onto.
	pub api_base: Url,
	/// OAuth authorize page for member sign-in links.
	pub authorize_endpoint: Url,
}
impl ApiDescriptor {
	/// Creates a new builder seeded with the production endpoints.
	pub fn builder() -> ApiDescriptorBuilder {
		ApiDescriptorBuilder::default()
	}

	/// Descriptor for the production service.
	pub fn production() -> Result<Self, DescriptorError> {
		Self::builder().build()
	}

	/// Resolves a relative endpoint path (for example `user/get`) against the API base.
	///
	/// Paths that resolve anywhere but below the base (absolute URLs, `..` segments) are
	/// rejected, so the access token is only ever sent to the configured host.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let url = self
			.api_base
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidEndpoint { path: path.to_owned(), source })?;

		if url.origin() != self.api_base.origin() || !url.path().starts_with(self.api_base.path()) {
			return Err(ConfigError::ForeignEndpoint { path: path.to_owned(), url: url.to_string() });
		}

		Ok(url)
	}

	fn validate(&self) -> Result<(), DescriptorError> {
		validate_https("api_base", &self.api_base)?;
		validate_https("authorize", &self.authorize_endpoint)?;

		if !self.api_base.path().ends_with('/') {
			return Err(DescriptorError::ApiBaseNotDirectory { url: self.api_base.to_string() });
		}
		if self.api_base.query().is_some() || self.api_base.fragment().is_some() {
			return Err(DescriptorError::ApiBaseHasQuery { url: self.api_base.to_string() });
		}

		Ok(())
	}
}

/// Builder for [`ApiDescriptor`] values.
#[derive(Clone, Debug, Default)]
pub struct ApiDescriptorBuilder {
	/// Optional API base override.
	pub api_base: Option<Url>,
	/// Optional authorize page override.
	pub authorize_endpoint: Option<Url>,
}
impl ApiDescriptorBuilder {
	/// Overrides the API base.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the OAuth authorize page.
	pub fn authorize_endpoint(mut self, url: Url) -> Self {
		self.authorize_endpoint = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ApiDescriptor, DescriptorError> {
		let api_base = match self.api_base {
			Some(url) => url,
			None => parse_default("api_base", DEFAULT_API_BASE)?,
		};
		let authorize_endpoint = match self.authorize_endpoint {
			Some(url) => url,
			None => parse_default("authorize", DEFAULT_AUTHORIZE_ENDPOINT)?,
		};
		let descriptor = ApiDescriptor { api_base, authorize_endpoint };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

fn parse_default(endpoint: &'static str, raw: &str) -> Result<Url, DescriptorError> {
	Url::parse(raw).map_err(|source| DescriptorError::InvalidUrl { endpoint, source })
}

fn validate_https(endpoint: &'static str, url: &Url) -> Result<(), DescriptorError> {
	if url.scheme() != "https" {
		Err(DescriptorError::InsecureEndpoint { endpoint, url: url.to_string() })
	} else {
		Ok(())
	}
}
