//! Persisted session layout.

// self
use crate::{_prelude::*, auth::AccessToken, error::PersistError};

/// Serialized form of a session.
///
/// The JSON object always carries exactly four keys. A `null` access token means "no
/// session" and restores as the null session; a `null` start time stands for the epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
	/// Access token (with its consumer), or `None` for an unauthenticated session.
	pub access_token: Option<AccessToken>,
	/// OAuth callback target.
	pub redirect_url: String,
	/// Instant the access token was obtained or last renewed.
	pub access_token_start_time: Option<OffsetDateTime>,
	/// Whether the sandbox endpoint family is used.
	pub sandbox: bool,
}
impl PersistedSession {
	/// Layout written for the null session.
	pub fn empty() -> Self {
		Self {
			access_token: None,
			redirect_url: String::new(),
			access_token_start_time: None,
			sandbox: true,
		}
	}

	/// Serializes the layout to JSON bytes.
	pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
		serde_json::to_vec(self).map_err(PersistError::Serialize)
	}

	/// Parses JSON bytes, reporting the path of the first malformed field.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);

		Ok(serde_path_to_error::deserialize(&mut de)?)
	}
}
