//! OAuth 1.0a request signing (RFC 5849, section 3).
//!
//! The functions here are deliberately pure: callers supply the nonce and timestamp through
//! [`OAuthParams`], which keeps signatures reproducible in tests.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distr::Alphanumeric};
use sha1::{Digest, Sha1};
use sha2::Sha256;
// self
use crate::{_prelude::*, error::ConfigError};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 32;
const OAUTH_VERSION: &str = "1.0";

/// Signature methods understood by the signer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
	/// HMAC-SHA1, the method E*Trade requires.
	#[default]
	HmacSha1,
	/// HMAC-SHA256 for providers that accept it.
	HmacSha256,
}
impl SignatureMethod {
	/// Returns the `oauth_signature_method` value.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignatureMethod::HmacSha1 => "HMAC-SHA1",
			SignatureMethod::HmacSha256 => "HMAC-SHA256",
		}
	}

	fn digest(self, bytes: &[u8]) -> Vec<u8> {
		match self {
			SignatureMethod::HmacSha1 => Sha1::digest(bytes).to_vec(),
			SignatureMethod::HmacSha256 => Sha256::digest(bytes).to_vec(),
		}
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Protocol parameters (`oauth_*`) attached to one signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthParams {
	/// `oauth_consumer_key`.
	pub consumer_key: String,
	/// `oauth_token`, absent on the request-token leg.
	pub token: Option<String>,
	/// `oauth_signature_method`.
	pub signature_method: SignatureMethod,
	/// `oauth_timestamp`, seconds since the epoch.
	pub timestamp: i64,
	/// `oauth_nonce`.
	pub nonce: String,
	/// `oauth_callback`, only sent on the request-token leg.
	pub callback: Option<String>,
	/// `oauth_verifier`, only sent on the access-token leg.
	pub verifier: Option<String>,
	/// `oauth_body_hash`, when body hashing is enabled.
	pub body_hash: Option<String>,
}
impl OAuthParams {
	/// Creates parameters with a fresh nonce and the current timestamp.
	pub fn new(consumer_key: impl Into<String>, signature_method: SignatureMethod) -> Self {
		Self {
			consumer_key: consumer_key.into(),
			token: None,
			signature_method,
			timestamp: OffsetDateTime::now_utc().unix_timestamp(),
			nonce: random_nonce(),
			callback: None,
			verifier: None,
			body_hash: None,
		}
	}

	/// Sets `oauth_token`.
	pub fn with_token(mut self, token: impl Into<String>) -> Self {
		self.token = Some(token.into());

		self
	}

	/// Sets `oauth_callback`.
	pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
		self.callback = Some(callback.into());

		self
	}

	/// Sets `oauth_verifier`.
	pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
		self.verifier = Some(verifier.into());

		self
	}

	/// Computes `oauth_body_hash` over `body` with the digest matching the signature method.
	pub fn with_body_hash(mut self, body: &[u8]) -> Self {
		self.body_hash = Some(STANDARD.encode(self.signature_method.digest(body)));

		self
	}

	/// Overrides the nonce.
	pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
		self.nonce = nonce.into();

		self
	}

	/// Overrides the timestamp.
	pub fn with_timestamp(mut self, timestamp: i64) -> Self {
		self.timestamp = timestamp;

		self
	}

	fn pairs(&self) -> Vec<(&'static str, String)> {
		let mut pairs = vec![
			("oauth_consumer_key", self.consumer_key.clone()),
			("oauth_nonce", self.nonce.clone()),
			("oauth_signature_method", self.signature_method.as_str().to_owned()),
			("oauth_timestamp", self.timestamp.to_string()),
			("oauth_version", OAUTH_VERSION.to_owned()),
		];

		if let Some(token) = &self.token {
			pairs.push(("oauth_token", token.clone()));
		}
		if let Some(callback) = &self.callback {
			pairs.push(("oauth_callback", callback.clone()));
		}
		if let Some(verifier) = &self.verifier {
			pairs.push(("oauth_verifier", verifier.clone()));
		}
		if let Some(body_hash) = &self.body_hash {
			pairs.push(("oauth_body_hash", body_hash.clone()));
		}

		pairs
	}
}

// Everything except the RFC 3986 unreserved characters.
const OAUTH_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes `value` with the RFC 3986 unreserved set, as OAuth requires.
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Builds the signature base string for a request.
///
/// Query parameters of `url`, the optional form-encoded body, and every protocol parameter
/// are encoded, sorted, and joined as described in RFC 5849 section 3.4.1.
pub fn signature_base_string(
	method: &str,
	url: &Url,
	params: &OAuthParams,
	form_body: Option<&[u8]>,
) -> String {
	let mut pairs: Vec<(String, String)> = url
		.query_pairs()
		.map(|(key, value)| (percent_encode(&key), percent_encode(&value)))
		.collect();

	if let Some(body) = form_body {
		pairs.extend(
			url::form_urlencoded::parse(body)
				.map(|(key, value)| (percent_encode(&key), percent_encode(&value))),
		);
	}

	pairs.extend(
		params.pairs().into_iter().map(|(key, value)| (percent_encode(key), percent_encode(&value))),
	);
	pairs.sort();

	let normalized = pairs
		.iter()
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join("&");

	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		percent_encode(&base_string_uri(url)),
		percent_encode(&normalized)
	)
}

/// Signs `base_string` with `consumer_secret&token_secret`.
pub fn sign(
	base_string: &str,
	method: SignatureMethod,
	consumer_secret: &str,
	token_secret: Option<&str>,
) -> Result<String> {
	let key = format!(
		"{}&{}",
		percent_encode(consumer_secret),
		percent_encode(token_secret.unwrap_or_default())
	);
	let digest = match method {
		SignatureMethod::HmacSha1 => {
			let mut mac = <HmacSha1 as Mac>::new_from_slice(key.as_bytes())
				.map_err(|_| ConfigError::InvalidSigningKey)?;

			mac.update(base_string.as_bytes());
			mac.finalize().into_bytes().to_vec()
		},
		SignatureMethod::HmacSha256 => {
			let mut mac = <HmacSha256 as Mac>::new_from_slice(key.as_bytes())
				.map_err(|_| ConfigError::InvalidSigningKey)?;

			mac.update(base_string.as_bytes());
			mac.finalize().into_bytes().to_vec()
		},
	};

	Ok(STANDARD.encode(digest))
}

/// Renders the `Authorization: OAuth ...` header value.
pub fn authorization_header(params: &OAuthParams, signature: &str) -> String {
	let mut pairs = params.pairs();

	pairs.push(("oauth_signature", signature.to_owned()));
	pairs.sort();

	let rendered = pairs
		.iter()
		.map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
		.collect::<Vec<_>>()
		.join(", ");

	format!("OAuth {rendered}")
}

fn base_string_uri(url: &Url) -> String {
	let port = url.port().map(|port| format!(":{port}")).unwrap_or_default();

	format!("{}://{}{port}{}", url.scheme(), url.host_str().unwrap_or_default(), url.path())
}

fn random_nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}
