//! Crate-level error types shared by the token manager, the request gate, stores, and
//! transports.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts, malformed payloads).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Remote service reported an application-level failure through its `errcode` envelope.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// The credential supplier could not mint a token.
	///
	/// Every caller joined on the failed refresh receives a clone of the same shared cause.
	#[error("Credential supplier failed: {source}")]
	CredentialSupply {
		/// Failure reported by the supplier, shared across all waiters of that refresh.
		#[source]
		source: Arc<Error>,
	},
	/// The remote service rejected a freshly refreshed credential again.
	#[error("Remote service rejected the refreshed credential (errcode {code}): {message}.")]
	CredentialRejected {
		/// Remote error code reported on the final attempt.
		code: i64,
		/// Remote error message reported on the final attempt.
		message: String,
	},
}
impl Error {
	/// Returns the remote error payload when the failure came from the `errcode` envelope.
	pub fn api_error(&self) -> Option<&ApiError> {
		match self {
			Self::Api(inner) => Some(inner),
			_ => None,
		}
	}

	/// Returns the shared supplier cause when the failure came from a credential refresh.
	pub fn supply_cause(&self) -> Option<&Arc<Error>> {
		match self {
			Self::CredentialSupply { source } => Some(source),
			_ => None,
		}
	}
}

/// Application-level failure reported by the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Remote API returned errcode {code}: {message}.")]
pub struct ApiError {
	/// Remote `errcode` value (never `0`).
	pub code: i64,
	/// Remote `errmsg` value.
	pub message: String,
}
impl ApiError {
	/// Creates an error payload from the remote envelope fields.
	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self { code, message: message.into() }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Endpoint path could not be joined onto the API base.
	#[error("Endpoint `{path}` cannot be resolved against the API base.")]
	InvalidEndpoint {
		/// Relative endpoint path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint path resolved outside the API base.
	#[error("Endpoint `{path}` escapes the API base: {url}.")]
	ForeignEndpoint {
		/// Endpoint path as supplied.
		path: String,
		/// URL the path resolved to.
		url: String,
	},
	/// Descriptor validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::descriptor::DescriptorError),
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// A granted lifetime pushes the expiry past the representable time range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Repeated grants expired within the safety margin, so no usable credential exists.
	#[error("Granted lifetime {ttl} does not outlast the {margin} safety margin.")]
	LifetimeWithinMargin {
		/// Lifetime of the last grant.
		ttl: Duration,
		/// Safety margin the grant had to outlast.
		margin: Duration,
	},
	/// Token endpoint returned a negative duration.
	#[error("The expires_in value must not be negative.")]
	NegativeExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts, malformed responses).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete before the transport deadline.
	#[error("Request timed out while calling the remote API.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote API.")]
	Io(#[from] std::io::Error),
	/// Remote service answered with a non-success HTTP status and no usable envelope.
	#[error("Remote API answered with HTTP status {status}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body_preview: String,
	},
	/// Response body was not the JSON shape the caller expected.
	#[error("Remote API returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport failed without a more specific classification.
	#[error("HTTP client error occurred while calling the remote API: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
