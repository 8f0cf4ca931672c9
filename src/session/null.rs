//! Stand-in used whenever no credential is available.

// self
use crate::{
	_prelude::*,
	http::HttpResponse,
	session::{AuthCodeRetriever, PersistedSession, RequestOptions},
};

/// Shared null session.
pub const NULL_SESSION: NullSession = NullSession;

/// Session without state that answers every query as "expired, nothing to do".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NullSession;
impl NullSession {
	/// Returns itself; there is nothing to authenticate.
	pub fn authenticate(&self, _retriever: Option<&dyn AuthCodeRetriever>) -> &Self {
		self
	}

	/// Always `None`.
	pub fn get(&self, _path: &str, _options: RequestOptions) -> Option<HttpResponse> {
		None
	}

	/// Always `None`.
	pub fn post(
		&self,
		_path: &str,
		_body: impl Into<Vec<u8>>,
		_options: RequestOptions,
	) -> Option<HttpResponse> {
		None
	}

	/// Always `None`.
	pub fn put(
		&self,
		_path: &str,
		_body: impl Into<Vec<u8>>,
		_options: RequestOptions,
	) -> Option<HttpResponse> {
		None
	}

	/// Always `None`.
	pub fn delete(&self, _path: &str, _options: RequestOptions) -> Option<HttpResponse> {
		None
	}

	/// Always `false`.
	pub fn renew(&self) -> bool {
		false
	}

	/// Always `true`.
	pub fn is_expired(&self) -> bool {
		self.time_left() <= Duration::ZERO
	}

	/// Always zero.
	pub fn time_left(&self) -> Duration {
		Duration::ZERO
	}

	/// Always `00:00:00`.
	pub fn time_left_pretty(&self) -> String {
		"00:00:00".into()
	}

	/// Always the epoch.
	pub fn expire_time(&self) -> OffsetDateTime {
		OffsetDateTime::UNIX_EPOCH
	}

	/// Layout persisted for the null session.
	pub fn snapshot(&self) -> PersistedSession {
		PersistedSession::empty()
	}

	/// Serializes [`NullSession::snapshot`] to JSON bytes.
	pub fn dump(&self) -> Result<Vec<u8>> {
		Ok(self.snapshot().to_bytes()?)
	}
}
