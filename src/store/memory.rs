//! Thread-safe in-memory [`CredentialStore`] implementation, the default backend.

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialScope},
	store::{CredentialStore, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<CredentialScope, Credential>>>;

/// Process-local store; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of scopes currently holding a credential.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no credential has been saved yet.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialStore for MemoryStore {
	fn fetch<'a>(&'a self, scope: &'a CredentialScope) -> StoreFuture<'a, Option<Credential>> {
		let found = self.0.read().get(scope).cloned();

		Box::pin(async move { Ok(found) })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(credential.scope.clone(), credential);

			Ok(())
		})
	}
}
