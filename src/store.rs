//! Storage contracts and built-in store implementations for access-token credentials.
//!
//! A [`TokenManager`](crate::token::TokenManager) keeps its own copy of the current credential
//! and republishes every freshly minted one through a [`CredentialStore`]. Pointing several
//! managers (or processes) at one store lets them adopt each other's credentials instead of
//! each minting their own.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialScope},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by credential stores.
///
/// Stores are last-writer-wins: `save` replaces whatever the scope held before.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the credential associated with `scope`, if present.
	fn fetch<'a>(&'a self, scope: &'a CredentialScope) -> StoreFuture<'a, Option<Credential>>;

	/// Persists or replaces the credential for its scope.
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "redis unreachable".into() };
		let err: Error = store_error.clone().into();

		assert!(matches!(err, Error::Storage(_)));
		assert!(err.to_string().contains("redis unreachable"));

		let source =
			StdError::source(&err).expect("Crate error should expose the store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
