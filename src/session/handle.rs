//! Live-or-null session wrapper.

// self
use crate::{
	_prelude::*,
	http::{HttpResponse, HttpTransport},
	session::{
		AuthCodeRetriever, NULL_SESSION, NullSession, PersistedSession, RequestOptions, Session,
	},
	store::SessionStore,
};

/// Either a live [`Session`] or the [`NullSession`].
///
/// Every operation is available on both variants, so code holding a handle never checks for
/// absence: the null variant answers as an expired session whose requests produce nothing.
pub enum SessionHandle<C>
where
	C: ?Sized + HttpTransport,
{
	/// Session backed by a (possibly expired) credential.
	Live(Session<C>),
	/// Placeholder used when no credential exists.
	Null(NullSession),
}
impl<C> SessionHandle<C>
where
	C: ?Sized + HttpTransport,
{
	/// Restores a handle from bytes produced by `dump`.
	///
	/// A persisted layout without an access token yields [`SessionHandle::Null`].
	pub fn load(bytes: &[u8], http_client: impl Into<Arc<C>>) -> Result<Self> {
		let persisted = PersistedSession::from_bytes(bytes)?;

		Self::from_snapshot(persisted, http_client)
	}

	/// Restores a handle from an already parsed layout.
	pub fn from_snapshot(
		persisted: PersistedSession,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		if persisted.access_token.is_none() {
			return Ok(Self::Null(NULL_SESSION));
		}

		Ok(Self::Live(Session::restore(persisted, http_client)?))
	}

	/// Restores the snapshot stored under `name`, or the null session when nothing is stored.
	pub async fn load_from(
		store: &dyn SessionStore,
		name: &str,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		match store.fetch(name).await? {
			Some(persisted) => Self::from_snapshot(persisted, http_client),
			None => Ok(Self::Null(NULL_SESSION)),
		}
	}

	/// Stores the current snapshot under `name`.
	pub async fn save_to(&self, store: &dyn SessionStore, name: &str) -> Result<()> {
		store.save(name, self.snapshot()).await?;

		Ok(())
	}

	/// `true` for [`SessionHandle::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null(_))
	}

	/// Borrows the live session, if any.
	pub fn as_live(&self) -> Option<&Session<C>> {
		match self {
			Self::Live(session) => Some(session),
			Self::Null(_) => None,
		}
	}

	/// Mutably borrows the live session, if any.
	pub fn as_live_mut(&mut self) -> Option<&mut Session<C>> {
		match self {
			Self::Live(session) => Some(session),
			Self::Null(_) => None,
		}
	}

	/// Authenticates a live session; the null session returns itself untouched.
	pub async fn authenticate(
		&mut self,
		retriever: Option<&dyn AuthCodeRetriever>,
	) -> Result<&mut Self> {
		if let Self::Live(session) = self {
			session.authenticate(retriever).await?;
		}

		Ok(self)
	}

	/// Signed `GET`; `None` for the null session.
	pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Option<HttpResponse>> {
		match self {
			Self::Live(session) => session.get(path, options).await.map(Some),
			Self::Null(null) => Ok(null.get(path, options)),
		}
	}

	/// Signed `POST`; `None` for the null session.
	pub async fn post(
		&self,
		path: &str,
		body: impl Into<Vec<u8>>,
		options: RequestOptions,
	) -> Result<Option<HttpResponse>> {
		match self {
			Self::Live(session) => session.post(path, body, options).await.map(Some),
			Self::Null(null) => Ok(null.post(path, body, options)),
		}
	}

	/// Signed `PUT`; `None` for the null session.
	pub async fn put(
		&self,
		path: &str,
		body: impl Into<Vec<u8>>,
		options: RequestOptions,
	) -> Result<Option<HttpResponse>> {
		match self {
			Self::Live(session) => session.put(path, body, options).await.map(Some),
			Self::Null(null) => Ok(null.put(path, body, options)),
		}
	}

	/// Signed `DELETE`; `None` for the null session.
	pub async fn delete(
		&self,
		path: &str,
		options: RequestOptions,
	) -> Result<Option<HttpResponse>> {
		match self {
			Self::Live(session) => session.delete(path, options).await.map(Some),
			Self::Null(null) => Ok(null.delete(path, options)),
		}
	}

	/// Renews a live session; always `false` for the null session.
	pub async fn renew(&mut self) -> Result<bool> {
		match self {
			Self::Live(session) => session.renew().await,
			Self::Null(null) => Ok(null.renew()),
		}
	}

	/// See [`Session::is_expired`].
	pub fn is_expired(&self) -> bool {
		match self {
			Self::Live(session) => session.is_expired(),
			Self::Null(null) => null.is_expired(),
		}
	}

	/// See [`Session::time_left`].
	pub fn time_left(&self) -> Duration {
		match self {
			Self::Live(session) => session.time_left(),
			Self::Null(null) => null.time_left(),
		}
	}

	/// See [`Session::time_left_pretty`].
	pub fn time_left_pretty(&self) -> String {
		match self {
			Self::Live(session) => session.time_left_pretty(),
			Self::Null(null) => null.time_left_pretty(),
		}
	}

	/// See [`Session::expire_time`].
	pub fn expire_time(&self) -> OffsetDateTime {
		match self {
			Self::Live(session) => session.expire_time(),
			Self::Null(null) => null.expire_time(),
		}
	}

	/// Persistable state of either variant.
	pub fn snapshot(&self) -> PersistedSession {
		match self {
			Self::Live(session) => session.snapshot(),
			Self::Null(null) => null.snapshot(),
		}
	}

	/// Serializes [`SessionHandle::snapshot`] to JSON bytes.
	pub fn dump(&self) -> Result<Vec<u8>> {
		Ok(self.snapshot().to_bytes()?)
	}
}
impl<C> Debug for SessionHandle<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Live(session) => f.debug_tuple("Live").field(session).finish(),
			Self::Null(null) => f.debug_tuple("Null").field(null).finish(),
		}
	}
}
impl<C> From<Session<C>> for SessionHandle<C>
where
	C: ?Sized + HttpTransport,
{
	fn from(session: Session<C>) -> Self {
		Self::Live(session)
	}
}
impl<C> From<NullSession> for SessionHandle<C>
where
	C: ?Sized + HttpTransport,
{
	fn from(null: NullSession) -> Self {
		Self::Null(null)
	}
}
