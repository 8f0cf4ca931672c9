//! Registered API client identity used to sign every request.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Consumer key + secret issued by the provider when the application was registered.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerCredentials {
	/// Public consumer key (`oauth_consumer_key`).
	pub key: String,
	/// Consumer secret; first half of the signing key.
	pub secret: TokenSecret,
}
impl ConsumerCredentials {
	/// Pairs a consumer key with its secret.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { key: key.into(), secret: TokenSecret::new(secret) }
	}
}
impl Debug for ConsumerCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConsumerCredentials")
			.field("key", &self.key)
			.field("secret", &"<redacted>")
			.finish()
	}
}
