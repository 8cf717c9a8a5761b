//! Immutable access-token credentials and the scope they belong to.

// self
use crate::{
	_prelude::*,
	auth::{CorpId, TokenSecret},
};

/// Application identity a credential is minted for.
///
/// The platform issues one access token per `corpid` + `corpsecret` pair, so the scope keeps
/// the corp identifier and a fingerprint of the secret. Stores partition records by scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialScope {
	/// Corp that owns the application.
	pub corp_id: CorpId,
	/// Fingerprint of the corp secret used to mint tokens.
	pub secret_fingerprint: String,
}
impl CredentialScope {
	/// Builds a scope for the provided corp and secret.
	pub fn new(corp_id: CorpId, secret: &TokenSecret) -> Self {
		Self { corp_id, secret_fingerprint: secret.fingerprint() }
	}
}
impl Display for CredentialScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}#{}", self.corp_id, &self.secret_fingerprint[..self.secret_fingerprint.len().min(8)])
	}
}

/// Errors produced by [`CredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialBuilderError {
	/// No token value was provided.
	#[error("Access token is required.")]
	MissingToken,
	/// No expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Short-lived access token plus its absolute expiry instant.
///
/// Values are never mutated: a refresh produces a new credential that supersedes the old one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Application identity the token was minted for.
	pub scope: CredentialScope,
	/// Access token attached to outgoing calls.
	pub token: TokenSecret,
	/// Instant the token was minted.
	pub issued_at: OffsetDateTime,
	/// Instant after which the remote service no longer accepts the token.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Returns a builder for the provided scope.
	pub fn builder(scope: CredentialScope) -> CredentialBuilder {
		CredentialBuilder::new(scope)
	}

	/// Returns `true` when `instant < expires_at`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}

	/// Returns `true` when the credential stays valid past `instant + margin`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		instant.checked_add(margin).is_some_and(|deadline| self.is_valid_at(deadline))
	}

	/// Returns `true` when both credentials carry the same token value.
	pub fn same_token(&self, other: &Self) -> bool {
		self.token == other.token
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("scope", &self.scope)
			.field("token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Credential`].
#[derive(Clone, Debug)]
pub struct CredentialBuilder {
	scope: CredentialScope,
	token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CredentialBuilder {
	fn new(scope: CredentialScope) -> Self {
		Self { scope, token: None, issued_at: None, expires_at: None, expires_in: None }
	}

	/// Provides the access token value.
	pub fn token(mut self, token: impl Into<String>) -> Self {
		self.token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative lifetime measured from the issued instant.
	pub fn expires_in(mut self, ttl: Duration) -> Self {
		self.expires_in = Some(ttl);

		self
	}

	/// Consumes the builder and produces a [`Credential`].
	pub fn build(self) -> Result<Credential, CredentialBuilderError> {
		let token = self.token.ok_or(CredentialBuilderError::MissingToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(ttl)) => issued_at + ttl,
			(None, None) => return Err(CredentialBuilderError::MissingExpiry),
		};

		Ok(Credential { scope: self.scope, token, issued_at, expires_at })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn scope() -> CredentialScope {
		CredentialScope::new(
			CorpId::new("wx-corp").expect("Corp fixture should be valid."),
			&TokenSecret::new("corp-secret"),
		)
	}

	#[test]
	fn freshness_respects_the_safety_margin() {
		let credential = Credential::builder(scope())
			.token("T1")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::hours(2))
			.build()
			.expect("Credential builder should succeed.");
		let margin = Duration::seconds(10);

		assert_eq!(credential.expires_at, macros::datetime!(2025-01-01 02:00 UTC));
		assert!(credential.is_fresh_at(macros::datetime!(2025-01-01 01:59:49 UTC), margin));
		assert!(!credential.is_fresh_at(macros::datetime!(2025-01-01 01:59:50 UTC), margin));
		assert!(credential.is_valid_at(macros::datetime!(2025-01-01 01:59:59 UTC)));
		assert!(!credential.is_valid_at(macros::datetime!(2025-01-01 02:00 UTC)));
	}

	#[test]
	fn zero_ttl_is_never_fresh() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = Credential::builder(scope())
			.token("T0")
			.issued_at(issued)
			.expires_in(Duration::ZERO)
			.build()
			.expect("Zero-lifetime credentials are still representable.");

		assert!(!credential.is_valid_at(issued));
		assert!(!credential.is_fresh_at(issued, Duration::ZERO));
	}

	#[test]
	fn builder_requires_token_and_expiry() {
		assert_eq!(
			Credential::builder(scope()).expires_in(Duration::MINUTE).build(),
			Err(CredentialBuilderError::MissingToken)
		);
		assert_eq!(
			Credential::builder(scope()).token("T1").build(),
			Err(CredentialBuilderError::MissingExpiry)
		);
	}

	#[test]
	fn debug_output_redacts_the_token() {
		let credential = Credential::builder(scope())
			.token("very-secret-token")
			.expires_in(Duration::MINUTE)
			.build()
			.expect("Credential builder should succeed.");

		assert!(!format!("{credential:?}").contains("very-secret-token"));
		assert!(scope().to_string().starts_with("wx-corp#"));
	}
}
