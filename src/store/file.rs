//! Simple file-backed [`SessionStore`] for command-line tools and bots.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	session::PersistedSession,
	store::{SessionStore, StoreError, StoreFuture},
};

type Snapshots = BTreeMap<String, PersistedSession>;

/// Persists named session snapshots to a JSON file after each mutation.
///
/// Writes go to a sibling `.tmp` file that is synced and then renamed over the target, so a
/// crash never leaves a half-written snapshot behind.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshots>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshots, StoreError> {
		if !path.exists() {
			return Ok(Snapshots::new());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(Snapshots::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Snapshots) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize session snapshots: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl SessionStore for FileStore {
	fn save<'a>(&'a self, name: &'a str, snapshot: PersistedSession) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.insert(name.to_owned(), snapshot);
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<PersistedSession>> {
		Box::pin(async move { Ok(self.inner.read().get(name).cloned()) })
	}

	fn remove<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<PersistedSession>> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let removed = guard.remove(name);

			if removed.is_some() {
				self.persist_locked(&guard)?;
			}

			Ok(removed)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use time::macros::datetime;
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::{AccessToken, ConsumerCredentials};

	fn temp_path() -> PathBuf {
		let unique = format!(
			"etrade_oauth_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn live_snapshot() -> PersistedSession {
		PersistedSession {
			access_token: Some(AccessToken::new(
				"access",
				"access-secret",
				ConsumerCredentials::new("key", "secret"),
			)),
			redirect_url: "oob".into(),
			access_token_start_time: Some(datetime!(2024-05-06 14:00:00.25 UTC)),
			sandbox: false,
		}
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save("production", live_snapshot()))
			.expect("Failed to save snapshot to file store.");
		rt.block_on(store.save("empty", PersistedSession::empty()))
			.expect("Failed to save empty snapshot to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.fetch("production"))
			.expect("Failed to fetch snapshot from file store.")
			.expect("File store lost snapshot after reopen.");

		assert_eq!(fetched, live_snapshot());
		assert!(
			rt.block_on(reopened.remove("empty"))
				.expect("Failed to remove snapshot from file store.")
				.is_some()
		);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert_eq!(
			rt.block_on(reopened.fetch("empty")).expect("Failed to fetch from file store."),
			None
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn empty_files_open_as_empty_stores() {
		let path = temp_path();

		File::create(&path).expect("Failed to create empty snapshot file.");

		let store = FileStore::open(&path).expect("Empty files should open.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		assert_eq!(rt.block_on(store.fetch("any")).expect("Fetch should succeed."), None);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
