//! Transport primitives for signed provider calls.
//!
//! The module exposes [`HttpTransport`] alongside [`ResponseMetadata`] so downstream crates can
//! plug in custom HTTP clients. Requests and responses use the `http` crate's types with owned
//! byte bodies, which keeps the OAuth layer independent of any particular client.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use ::http::HeaderMap;
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// Outbound request with an owned body.
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Provider response with an owned body.
pub type HttpResponse = ::http::Response<Vec<u8>>;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of dispatching already-signed requests.
///
/// This trait is the crate's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a single transport can back many sessions, and must not
/// follow redirects: a redirected OAuth request would be replayed with a signature computed
/// for the original URL. Transport failures are expected to surface as
/// [`TransportError`](crate::error::TransportError); HTTP status codes are never errors at
/// this layer.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves once the full response body has been read.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Metadata extracted from a provider response for downstream error mapping.
///
/// Additional metadata fields may be added in future releases, so downstream code
/// should construct values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the provider.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Captures status and Retry-After from a response.
	pub fn from_response(response: &HttpResponse) -> Self {
		Self {
			status: Some(response.status().as_u16()),
			retry_after: parse_retry_after(response.headers()),
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client disables redirect following; configure any custom [`ReqwestClient`]
/// the same way before handing it to [`ReqwestHttpClient::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with redirects disabled.
	pub fn try_new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl Default for ReqwestHttpClient {
	fn default() -> Self {
		Self::try_new().unwrap_or_else(|_| Self(ReqwestClient::default()))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request)
				.map_err(crate::error::ConfigError::from)?;
			let response = client
				.execute(request)
				.await
				.map_err(crate::error::TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(crate::error::TransportError::from)?;
			let mut response_new = HttpResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(::http::header::RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
