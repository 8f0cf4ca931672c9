//! Long-lived (well, two-hour) access credentials and their consumer back-reference.

// self
use crate::{
	_prelude::*,
	auth::{ConsumerCredentials, TokenSecret},
	error::TransientError,
};

/// Access token obtained at the end of the three-legged handshake.
///
/// The token carries the consumer it was issued to so a persisted token is enough to rebuild
/// a signing-capable session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Access token identifier (`oauth_token`).
	pub token: String,
	/// Access token secret; second half of the signing key.
	pub secret: TokenSecret,
	/// Consumer that requested the token.
	pub consumer: ConsumerCredentials,
}
impl AccessToken {
	/// Builds an access token from its parts.
	pub fn new(
		token: impl Into<String>,
		secret: impl Into<String>,
		consumer: ConsumerCredentials,
	) -> Self {
		Self { token: token.into(), secret: TokenSecret::new(secret), consumer }
	}

	/// Parses the form-encoded body of an access-token response.
	pub fn from_form_body(
		body: &[u8],
		status: Option<u16>,
		consumer: ConsumerCredentials,
	) -> Result<Self, TransientError> {
		let mut token = None;
		let mut secret = None;

		for (key, value) in url::form_urlencoded::parse(body) {
			match key.as_ref() {
				"oauth_token" => token = Some(value.into_owned()),
				"oauth_token_secret" => secret = Some(value.into_owned()),
				_ => {},
			}
		}

		let token = token
			.filter(|value| !value.is_empty())
			.ok_or(TransientError::TokenResponseParse { field: "oauth_token", status })?;
		let secret =
			secret.ok_or(TransientError::TokenResponseParse { field: "oauth_token_secret", status })?;

		Ok(Self::new(token, secret, consumer))
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &self.token)
			.field("secret", &"<redacted>")
			.field("consumer", &self.consumer)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_and_keeps_consumer() {
		let consumer = ConsumerCredentials::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
		let token = AccessToken::from_form_body(
			b"oauth_token=nnch734d00sl2jdk&oauth_token_secret=pfkkdhi9sl3r4s00",
			Some(200),
			consumer.clone(),
		)
		.expect("Access token body should parse.");

		assert_eq!(token.token, "nnch734d00sl2jdk");
		assert_eq!(token.secret.expose(), "pfkkdhi9sl3r4s00");
		assert_eq!(token.consumer, consumer);
	}

	#[test]
	fn debug_output_hides_both_secrets() {
		let token = AccessToken::new(
			"token",
			"token-secret",
			ConsumerCredentials::new("key", "consumer-secret"),
		);
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("token-secret"));
		assert!(!rendered.contains("consumer-secret"));
	}
}
