//! OAuth 1.0a client facade used by sessions.
//!
//! [`OAuth1Client`] owns everything needed to sign a request on behalf of one consumer: the
//! credentials, the endpoint family, provider quirks, and the transport. Token-endpoint
//! failures are classified through the configured [`ProviderStrategy`]; responses to signed
//! API calls are returned untouched unless the provider reports an OAuth problem.

pub mod signature;

pub use signature::*;

// crates.io
use ::http::{
	HeaderMap, HeaderValue, Method,
	header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ConsumerCredentials, RequestToken},
	error::{ConfigError, TransientError},
	http::{HttpRequest, HttpResponse, HttpTransport, ResponseMetadata},
	obs,
	provider::{
		ProviderEndpoints, ProviderErrorContext, ProviderErrorKind, ProviderQuirks,
		ProviderStrategy, TokenStep,
	},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Consumer-level OAuth 1.0a client bound to one endpoint family.
pub struct OAuth1Client<C>
where
	C: ?Sized + HttpTransport,
{
	consumer: ConsumerCredentials,
	endpoints: ProviderEndpoints,
	quirks: ProviderQuirks,
	signature_method: SignatureMethod,
	token_method: Method,
	strategy: Arc<dyn ProviderStrategy>,
	http_client: Arc<C>,
}
impl<C> OAuth1Client<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client that performs token requests with `GET`.
	pub fn new(
		consumer: ConsumerCredentials,
		endpoints: ProviderEndpoints,
		quirks: ProviderQuirks,
		signature_method: SignatureMethod,
		strategy: Arc<dyn ProviderStrategy>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			consumer,
			endpoints,
			quirks,
			signature_method,
			token_method: Method::GET,
			strategy,
			http_client: http_client.into(),
		}
	}

	/// Overrides the HTTP method used on the token endpoints.
	pub fn with_token_method(mut self, method: Method) -> Self {
		self.token_method = method;

		self
	}

	/// Consumer credentials used for signing.
	pub fn consumer(&self) -> &ConsumerCredentials {
		&self.consumer
	}

	/// Endpoint family this client talks to.
	pub fn endpoints(&self) -> &ProviderEndpoints {
		&self.endpoints
	}

	/// Provider quirks applied while signing and building authorize URLs.
	pub fn quirks(&self) -> &ProviderQuirks {
		&self.quirks
	}

	/// Builds the human-facing authorization URL for `request_token`.
	pub fn authorize_url(&self, request_token: &RequestToken) -> Url {
		request_token.authorize_url(&self.endpoints.authorize, &self.consumer.key, &self.quirks)
	}

	/// First leg: obtains temporary credentials, announcing `callback` as `oauth_callback`.
	pub async fn get_request_token(&self, callback: &str) -> Result<RequestToken> {
		let params =
			OAuthParams::new(&self.consumer.key, self.signature_method).with_callback(callback);
		let response = self
			.token_request(TokenStep::RequestToken, self.endpoints.request_token.clone(), params, None)
			.await?;
		let status = Some(response.status().as_u16());

		Ok(RequestToken::from_form_body(response.body(), status)?)
	}

	/// Third leg: exchanges the request token and `verifier` for an access token.
	pub async fn get_access_token(
		&self,
		request_token: &RequestToken,
		verifier: &str,
	) -> Result<AccessToken> {
		let params = OAuthParams::new(&self.consumer.key, self.signature_method)
			.with_token(&request_token.token)
			.with_verifier(verifier);
		let response = self
			.token_request(
				TokenStep::AccessToken,
				self.endpoints.access_token.clone(),
				params,
				Some(request_token.secret.expose()),
			)
			.await?;
		let status = Some(response.status().as_u16());

		Ok(AccessToken::from_form_body(response.body(), status, self.consumer.clone())?)
	}

	/// Signs and dispatches an API request with `token`.
	///
	/// The response is returned whatever its status, except when the provider reports an
	/// OAuth problem through `WWW-Authenticate`, which surfaces as [`Error::TokenRejected`].
	pub async fn signed_request(
		&self,
		method: Method,
		url: Url,
		token: &AccessToken,
		headers: HeaderMap,
		body: Option<Vec<u8>>,
	) -> Result<HttpResponse> {
		let body = body.unwrap_or_default();
		let is_form = headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE));
		let mut params =
			OAuthParams::new(&token.consumer.key, self.signature_method).with_token(&token.token);

		if self.quirks.body_hash_enabled && !is_form && method_permits_body(&method) {
			params = params.with_body_hash(&body);
		}

		let base = signature_base_string(
			method.as_str(),
			&url,
			&params,
			is_form.then_some(body.as_slice()),
		);
		let signature = sign(
			&base,
			self.signature_method,
			token.consumer.secret.expose(),
			Some(token.secret.expose()),
		)?;
		let request = build_request(method, &url, headers, &params, &signature, body)?;

		obs::log_outgoing(&request);

		let response = self.http_client.execute(request).await?;

		if let Some(problem) = reported_problem(&response) {
			return Err(Error::TokenRejected { problem });
		}

		Ok(response)
	}

	async fn token_request(
		&self,
		step: TokenStep,
		mut url: Url,
		params: OAuthParams,
		token_secret: Option<&str>,
	) -> Result<HttpResponse> {
		let mut extra = BTreeMap::new();

		self.strategy.augment_token_request(step, &mut extra);

		if !extra.is_empty() {
			url.query_pairs_mut().extend_pairs(extra.iter());
		}

		let base = signature_base_string(self.token_method.as_str(), &url, &params, None);
		let signature =
			sign(&base, self.signature_method, self.consumer.secret.expose(), token_secret)?;
		let request = build_request(
			self.token_method.clone(),
			&url,
			HeaderMap::new(),
			&params,
			&signature,
			Vec::new(),
		)?;
		let response = self.http_client.execute(request).await?;

		if response.status().is_success() {
			Ok(response)
		} else {
			Err(self.map_token_error(step, &response))
		}
	}

	fn map_token_error(&self, step: TokenStep, response: &HttpResponse) -> Error {
		let meta = ResponseMetadata::from_response(response);
		let body = String::from_utf8_lossy(response.body()).into_owned();
		let problem = reported_problem(response).or_else(|| body_problem(response.body()));
		let mut ctx = ProviderErrorContext::new(step).with_body_preview(body);

		if let Some(status) = meta.status {
			ctx = ctx.with_http_status(status);
		}
		if let Some(problem) = &problem {
			ctx = ctx.with_oauth_problem(problem.clone());
		}

		let message = match (&problem, meta.status) {
			(Some(problem), _) => format!("{step} endpoint reported `{problem}`"),
			(None, Some(status)) => format!("{step} endpoint returned HTTP {status}"),
			(None, None) => format!("{step} endpoint failed"),
		};

		match self.strategy.classify_token_error(&ctx) {
			ProviderErrorKind::TokenRejected =>
				Error::TokenRejected { problem: problem.unwrap_or(message) },
			ProviderErrorKind::InvalidConsumer => Error::InvalidConsumer { reason: message },
			ProviderErrorKind::Transient => TransientError::TokenEndpoint {
				message,
				status: meta.status,
				retry_after: meta.retry_after,
			}
			.into(),
		}
	}
}
impl<C> Debug for OAuth1Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth1Client")
			.field("consumer", &self.consumer)
			.field("endpoints", &self.endpoints)
			.field("signature_method", &self.signature_method)
			.field("token_method", &self.token_method)
			.finish_non_exhaustive()
	}
}

/// Extracts `oauth_problem` from an OAuth Problem Reporting `WWW-Authenticate` header.
pub fn reported_problem(response: &HttpResponse) -> Option<String> {
	response
		.headers()
		.get_all(WWW_AUTHENTICATE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.find_map(|value| header_param(value, "oauth_problem"))
}

fn header_param(header: &str, name: &str) -> Option<String> {
	let header = header.trim_start();
	let (scheme, params) = header.split_once(' ')?;

	if !scheme.eq_ignore_ascii_case("OAuth") {
		return None;
	}

	params.split(',').find_map(|pair| {
		let (key, value) = pair.trim().split_once('=')?;

		(key.trim() == name).then(|| value.trim().trim_matches('"').to_owned())
	})
}

fn body_problem(body: &[u8]) -> Option<String> {
	url::form_urlencoded::parse(body)
		.find(|(key, _)| key == "oauth_problem")
		.map(|(_, value)| value.into_owned())
}

fn method_permits_body(method: &Method) -> bool {
	*method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

fn build_request(
	method: Method,
	url: &Url,
	headers: HeaderMap,
	params: &OAuthParams,
	signature: &str,
	body: Vec<u8>,
) -> Result<HttpRequest> {
	let authorization = HeaderValue::from_str(&authorization_header(params, signature))
		.map_err(|e| ConfigError::HttpRequest(e.into()))?;
	let mut request = ::http::Request::builder()
		.method(method)
		.uri(url.as_str())
		.body(body)
		.map_err(ConfigError::from)?;

	*request.headers_mut() = headers;
	request.headers_mut().insert(AUTHORIZATION, authorization);

	Ok(request)
}
