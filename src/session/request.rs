//! Request options for signed API calls.

// crates.io
use ::http::{
	HeaderMap, HeaderValue,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{_prelude::*, error::ConfigError, provider::ProviderEndpoints};

/// Representation negotiated with the API through `Accept` and `Content-Type`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
	/// `application/json`.
	#[default]
	Json,
	/// `application/xml`.
	Xml,
}
impl ContentType {
	/// MIME type sent in both headers.
	pub const fn mime(self) -> &'static str {
		match self {
			ContentType::Json => "application/json",
			ContentType::Xml => "application/xml",
		}
	}

	/// Builds the `Accept` + `Content-Type` header pair.
	pub fn headers(self) -> HeaderMap {
		let value = HeaderValue::from_static(self.mime());
		let mut headers = HeaderMap::with_capacity(2);

		headers.insert(ACCEPT, value.clone());
		headers.insert(CONTENT_TYPE, value);

		headers
	}
}
impl FromStr for ContentType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"json" => Ok(ContentType::Json),
			"xml" => Ok(ContentType::Xml),
			_ => Err(ConfigError::UnknownHeaderType { name: s.to_owned() }),
		}
	}
}
impl Display for ContentType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			ContentType::Json => "json",
			ContentType::Xml => "xml",
		})
	}
}

/// Per-call options for [`Session`](crate::session::Session) verbs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
	/// Query parameters; when non-empty they replace any query already present in the path.
	pub query: BTreeMap<String, String>,
	/// Representation used for the `Accept`/`Content-Type` headers.
	pub content_type: ContentType,
}
impl RequestOptions {
	/// JSON request without query parameters.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds (or replaces) a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.insert(key.into(), value.to_string());

		self
	}

	/// Overrides the content type.
	pub fn content_type(mut self, content_type: ContentType) -> Self {
		self.content_type = content_type;

		self
	}

	/// Builds the absolute request URL for `path`.
	pub fn url(&self, endpoints: &ProviderEndpoints, path: &str) -> Result<Url> {
		let mut url = endpoints.resolve(path)?;

		if !self.query.is_empty() {
			url.set_query(None);
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::Environment;

	#[test]
	fn content_type_parsing_rejects_unknown_names() {
		assert_eq!("json".parse::<ContentType>().ok(), Some(ContentType::Json));
		assert_eq!("xml".parse::<ContentType>().ok(), Some(ContentType::Xml));

		let err = "csv".parse::<ContentType>().expect_err("Only json and xml are supported.");

		assert!(matches!(err, ConfigError::UnknownHeaderType { name } if name == "csv"));
	}

	#[test]
	fn headers_pair_accept_and_content_type() {
		let headers = ContentType::Xml.headers();

		assert_eq!(headers.get(ACCEPT).map(HeaderValue::as_bytes), Some(&b"application/xml"[..]));
		assert_eq!(
			headers.get(CONTENT_TYPE).map(HeaderValue::as_bytes),
			Some(&b"application/xml"[..])
		);
	}

	#[test]
	fn url_encodes_query_as_form_data() {
		let endpoints =
			Environment::Production.endpoints().expect("Production endpoints should derive.");
		let url = RequestOptions::new()
			.query("count", 5)
			.query("symbols", "GOOG AAPL")
			.url(&endpoints, "/v1/accounts/list")
			.expect("Request URL should build.");

		assert_eq!(
			url.as_str(),
			"https://api.etrade.com/v1/accounts/list?count=5&symbols=GOOG+AAPL"
		);
	}

	#[test]
	fn query_replaces_inline_query_but_empty_query_keeps_it() {
		let endpoints = Environment::Sandbox.endpoints().expect("Sandbox endpoints should derive.");
		let replaced = RequestOptions::new()
			.query("a", "1")
			.url(&endpoints, "/v1/quote?b=2")
			.expect("Request URL should build.");
		let kept = RequestOptions::new()
			.url(&endpoints, "/v1/quote?b=2")
			.expect("Request URL should build.");
		let bare =
			RequestOptions::new().url(&endpoints, "/v1/quote").expect("Request URL should build.");

		assert_eq!(replaced.as_str(), "https://apisb.etrade.com/v1/quote?a=1");
		assert_eq!(kept.as_str(), "https://apisb.etrade.com/v1/quote?b=2");
		assert_eq!(bare.query(), None);
	}
}
