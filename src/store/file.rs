//! File-backed [`CredentialStore`] that lets several processes share one credential.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialScope},
	store::{CredentialStore, StoreError, StoreFuture},
};

type Snapshot = HashMap<CredentialScope, Credential>;

/// Persists credentials to a JSON file and re-reads it on every fetch.
///
/// Writers replace the file atomically (write to a sibling `.tmp`, then rename), so readers in
/// other processes always observe a complete snapshot. Concurrent writers are last-writer-wins.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	lock: Arc<Mutex<()>>,
}
impl FileStore {
	/// Opens (or prepares) a store at the provided path.
	///
	/// An existing file is parsed once up front so a corrupt snapshot fails early.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;
		Self::load_snapshot(&path)?;

		Ok(Self { path, lock: Arc::new(Mutex::new(())) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(HashMap::new());
		}

		let entries: Vec<Credential> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().map(|credential| (credential.scope.clone(), credential)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, contents: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut entries: Vec<_> = contents.values().collect();

		entries.sort_by(|a, b| a.scope.cmp(&b.scope));

		let serialized =
			serde_json::to_vec_pretty(&entries).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension(format!("{}.tmp", std::process::id()));

		let replaced = Self::write_synced(&tmp_path, &serialized).and_then(|()| {
			fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
				message: format!("Failed to replace {}: {e}", self.path.display()),
			})
		});

		// A failed write must not leave the sibling behind.
		if replaced.is_err() {
			let _ = fs::remove_file(&tmp_path);
		}

		replaced
	}

	fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
		let mut file = File::create(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to create {}: {e}", path.display()),
		})?;

		file.write_all(bytes).map_err(|e| StoreError::Backend {
			message: format!("Failed to write {}: {e}", path.display()),
		})?;
		file.sync_all().map_err(|e| StoreError::Backend {
			message: format!("Failed to sync {}: {e}", path.display()),
		})
	}
}
impl CredentialStore for FileStore {
	fn fetch<'a>(&'a self, scope: &'a CredentialScope) -> StoreFuture<'a, Option<Credential>> {
		Box::pin(async move {
			let _guard = self.lock.lock();
			let mut snapshot = Self::load_snapshot(&self.path)?;

			Ok(snapshot.remove(scope))
		})
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let _guard = self.lock.lock();
			let mut snapshot = Self::load_snapshot(&self.path)?;

			snapshot.insert(credential.scope.clone(), credential);
			self.persist(&snapshot)
		})
	}
}
