//! Storage contracts and built-in stores for persisted session snapshots.
//!
//! Stores keep [`PersistedSession`] values under caller-chosen names (one per account or
//! environment, for example). [`SessionHandle::save_to`](crate::session::SessionHandle::save_to)
//! and [`SessionHandle::load_from`](crate::session::SessionHandle::load_from) are the usual
//! entry points.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, session::PersistedSession};

/// Boxed future returned by [`SessionStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for session snapshots.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the snapshot stored under `name`.
	fn save<'a>(&'a self, name: &'a str, snapshot: PersistedSession) -> StoreFuture<'a, ()>;

	/// Fetches the snapshot stored under `name`, if present.
	fn fetch<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<PersistedSession>>;

	/// Removes the snapshot stored under `name`, returning it when it existed.
	fn remove<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<PersistedSession>>;
}

/// Error type produced by [`SessionStore`] implementations.
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
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unavailable"));

		let source =
			StdError::source(&error).expect("Crate error should expose the store error as source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
