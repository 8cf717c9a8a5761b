//! Redacting wrapper for access tokens and corp secrets.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Secret string that never prints its contents.
///
/// Used for both the long-lived corp secret and the short-lived access token. Store keys
/// derive from [`TokenSecret::fingerprint`] so the raw secret never leaves memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// URL-safe base64 (no padding) SHA-256 digest of the secret.
	pub fn fingerprint(&self) -> String {
		URL_SAFE_NO_PAD.encode(Sha256::digest(self.0.as_bytes()))
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_redact_the_value() {
		let secret = TokenSecret::new("corp-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(<redacted>)");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "corp-secret");
	}

	#[test]
	fn fingerprint_is_stable_and_hides_the_secret() {
		let a = TokenSecret::new("corp-secret");
		let b = TokenSecret::from("corp-secret");
		let c = TokenSecret::from(String::from("other-secret"));

		assert_eq!(a.fingerprint(), b.fingerprint());
		assert_ne!(a.fingerprint(), c.fingerprint());
		assert!(!a.fingerprint().contains("corp-secret"));
		// 32-byte digest, unpadded.
		assert_eq!(a.fingerprint().len(), 43);
	}
}
