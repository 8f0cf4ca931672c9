//! Temporary credentials returned by the request-token endpoint.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::TransientError,
	provider::ProviderQuirks,
};

/// Request token handed out during the first leg of the handshake.
///
/// The value is only useful until the verifier has been exchanged for an access token, so
/// it is never persisted.
#[derive(Clone)]
pub struct RequestToken {
	/// Temporary token identifier (`oauth_token`).
	pub token: String,
	/// Temporary token secret used to sign the access-token exchange.
	pub secret: TokenSecret,
	/// Whether the provider acknowledged the `oauth_callback` parameter.
	pub callback_confirmed: bool,
}
impl RequestToken {
	/// Builds a request token from its parts.
	pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { token: token.into(), secret: TokenSecret::new(secret), callback_confirmed: false }
	}

	/// Parses the `application/x-www-form-urlencoded` body of a request-token response.
	pub fn from_form_body(body: &[u8], status: Option<u16>) -> Result<Self, TransientError> {
		let mut token = None;
		let mut secret = None;
		let mut callback_confirmed = false;

		for (key, value) in url::form_urlencoded::parse(body) {
			match key.as_ref() {
				"oauth_token" => token = Some(value.into_owned()),
				"oauth_token_secret" => secret = Some(value.into_owned()),
				"oauth_callback_confirmed" => callback_confirmed = value == "true",
				_ => {},
			}
		}

		let token = token
			.filter(|value| !value.is_empty())
			.ok_or(TransientError::TokenResponseParse { field: "oauth_token", status })?;
		let secret =
			secret.ok_or(TransientError::TokenResponseParse { field: "oauth_token_secret", status })?;

		Ok(Self { token, secret: TokenSecret::new(secret), callback_confirmed })
	}

	/// Builds the human-facing authorization URL for this request token.
	///
	/// The provider expects the request token under the parameter name configured in
	/// [`ProviderQuirks::authorize_token_param`] (E*Trade uses `token` instead of the standard
	/// `oauth_token`) and, optionally, the consumer key next to it.
	pub fn authorize_url(&self, endpoint: &Url, consumer_key: &str, quirks: &ProviderQuirks) -> Url {
		let mut url = endpoint.clone();
		let mut pairs = url.query_pairs_mut();

		if let Some(key_param) = quirks.authorize_consumer_key_param.as_deref() {
			pairs.append_pair(key_param, consumer_key);
		}

		pairs.append_pair(&quirks.authorize_token_param, &self.token);

		drop(pairs);

		url
	}
}
impl Debug for RequestToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestToken")
			.field("token", &self.token)
			.field("secret", &"<redacted>")
			.field("callback_confirmed", &self.callback_confirmed)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_form_encoded_response() {
		let token = RequestToken::from_form_body(
			b"oauth_token=hh5s93j4hdidpola&oauth_token_secret=hdhd0244k9j7ao03&oauth_callback_confirmed=true",
			Some(200),
		)
		.expect("Request token body should parse.");

		assert_eq!(token.token, "hh5s93j4hdidpola");
		assert_eq!(token.secret.expose(), "hdhd0244k9j7ao03");
		assert!(token.callback_confirmed);
	}

	#[test]
	fn missing_token_is_a_parse_failure() {
		let err = RequestToken::from_form_body(b"oauth_token_secret=abc", Some(200))
			.expect_err("A body without oauth_token must be rejected.");

		assert!(matches!(err, TransientError::TokenResponseParse { field: "oauth_token", .. }));
	}

	#[test]
	fn authorize_url_uses_provider_parameter_names() {
		let token = RequestToken::new("req/token+1", "secret");
		let endpoint = Url::parse("https://us.etrade.com/e/t/etws/authorize")
			.expect("Authorize endpoint fixture should parse.");
		let url = token.authorize_url(&endpoint, "consumer-key", &ProviderQuirks::default());

		assert_eq!(
			url.as_str(),
			"https://us.etrade.com/e/t/etws/authorize?key=consumer-key&token=req%2Ftoken%2B1"
		);
		assert!(url.query_pairs().all(|(key, _)| key != "oauth_token"));
	}
}
