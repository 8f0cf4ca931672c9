//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	session::PersistedSession,
	store::{SessionStore, StoreFuture},
};

/// Thread-safe storage backend that keeps snapshots in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<String, PersistedSession>>>);
impl MemoryStore {
	/// Number of stored snapshots.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl SessionStore for MemoryStore {
	fn save<'a>(&'a self, name: &'a str, snapshot: PersistedSession) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.0.write().insert(name.to_owned(), snapshot);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<PersistedSession>> {
		Box::pin(async move { Ok(self.0.read().get(name).cloned()) })
	}

	fn remove<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<PersistedSession>> {
		Box::pin(async move { Ok(self.0.write().remove(name)) })
	}
}
