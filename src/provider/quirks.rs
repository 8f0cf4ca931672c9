//! Provider deviations from plain OAuth 1.0a.

// self
use crate::_prelude::*;

/// Provider-specific quirks that influence the handshake and signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Query parameter carrying the request token on the authorize page.
	///
	/// E*Trade expects `token` where the OAuth 1.0a specification says `oauth_token`.
	pub authorize_token_param: String,
	/// Query parameter carrying the consumer key on the authorize page, if any.
	pub authorize_consumer_key_param: Option<String>,
	/// Indicates whether `oauth_body_hash` is added when signing requests with bodies.
	pub body_hash_enabled: bool,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			authorize_token_param: "token".into(),
			authorize_consumer_key_param: Some("key".into()),
			body_hash_enabled: false,
		}
	}
}
