//! Session lifecycle: three-legged login, signed requests, expiry, renewal, persistence.
//!
//! [`Session`] owns one consumer's credential. [`Session::authenticate`] drives the OAuth 1.0a
//! handshake, the verbs sign and dispatch API calls, and [`Session::renew`] extends the
//! token's life. Expiry follows the provider's two rules (a rolling two-hour window and a hard
//! cut at midnight US/Eastern, see [`compute_expire_time`]). [`SessionHandle`] pairs a live
//! session with [`NullSession`] so callers holding "maybe a session" never branch on absence.

mod builder;
mod expiry;
mod handle;
mod metrics;
mod null;
mod persist;
mod request;
mod retriever;

pub use builder::*;
pub use expiry::*;
pub use handle::*;
pub use metrics::*;
pub use null::*;
pub use persist::*;
pub use request::*;
pub use retriever::*;

// crates.io
use ::http::{HeaderMap, Method};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::ConfigError,
	http::{HttpResponse, HttpTransport},
	oauth::{OAuth1Client, SignatureMethod},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{DefaultProviderStrategy, Environment, ProviderEndpoints, ProviderQuirks},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Session specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestSession = Session<ReqwestHttpClient>;

/// Access token paired with the instant it was obtained or last renewed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
	/// Token used to sign API calls.
	pub access_token: AccessToken,
	/// Start of the token's current validity window.
	pub started_at: OffsetDateTime,
}

/// OAuth 1.0a session for one consumer against one environment.
pub struct Session<C>
where
	C: ?Sized + HttpTransport,
{
	client: OAuth1Client<C>,
	environment: Environment,
	redirect_url: String,
	retriever: Option<Arc<dyn AuthCodeRetriever>>,
	credential: Option<Credential>,
	expire_time: Mutex<Option<OffsetDateTime>>,
	renew_metrics: Arc<RenewMetrics>,
}
impl Session<dyn HttpTransport> {
	/// Starts building a session.
	pub fn builder() -> SessionBuilder {
		SessionBuilder::new()
	}
}
impl<C> Session<C>
where
	C: ?Sized + HttpTransport,
{
	pub(crate) fn from_parts(
		client: OAuth1Client<C>,
		environment: Environment,
		redirect_url: String,
		retriever: Option<Arc<dyn AuthCodeRetriever>>,
		credential: Option<Credential>,
	) -> Self {
		Self {
			client,
			environment,
			redirect_url,
			retriever,
			credential,
			expire_time: Mutex::new(None),
			renew_metrics: Default::default(),
		}
	}

	/// Rebuilds a session from its persisted layout.
	///
	/// The access token and its start time must be present together. A `None` token yields an
	/// unauthenticated session; [`SessionHandle::load`] maps that case to the null session.
	pub fn restore(persisted: PersistedSession, http_client: impl Into<Arc<C>>) -> Result<Self> {
		let PersistedSession { access_token, redirect_url, access_token_start_time, sandbox } =
			persisted;
		let environment = Environment::from_sandbox(sandbox);
		let credential = match (access_token, access_token_start_time) {
			(Some(access_token), Some(started_at)) => Some(Credential { access_token, started_at }),
			(None, None) => None,
			_ => return Err(ConfigError::UnpairedCredential.into()),
		};
		let consumer = match &credential {
			Some(credential) => credential.access_token.consumer.clone(),
			None => Default::default(),
		};
		let client = OAuth1Client::new(
			consumer,
			environment.endpoints()?,
			ProviderQuirks::default(),
			SignatureMethod::default(),
			Arc::new(DefaultProviderStrategy),
			http_client,
		);

		Ok(Self::from_parts(client, environment, redirect_url, None, credential))
	}

	/// Environment the session talks to.
	pub fn environment(&self) -> Environment {
		self.environment
	}

	/// `true` when the sandbox endpoint family is in use.
	pub fn is_sandbox(&self) -> bool {
		self.environment.is_sandbox()
	}

	/// Endpoints requests are sent to.
	pub fn endpoints(&self) -> &ProviderEndpoints {
		self.client.endpoints()
	}

	/// OAuth callback target.
	pub fn redirect_url(&self) -> &str {
		&self.redirect_url
	}

	/// Current credential, if the session has authenticated.
	pub fn credential(&self) -> Option<&Credential> {
		self.credential.as_ref()
	}

	/// Current access token, if the session has authenticated.
	pub fn access_token(&self) -> Option<&AccessToken> {
		self.credential.as_ref().map(|credential| &credential.access_token)
	}

	/// `true` once an access token is held, expired or not.
	pub fn is_authenticated(&self) -> bool {
		self.credential.is_some()
	}

	/// Renewal counters for this session.
	pub fn renew_metrics(&self) -> &RenewMetrics {
		&self.renew_metrics
	}

	/// Runs the three-legged handshake and stores the resulting access token.
	///
	/// `retriever` overrides the one configured on the builder; one of them must be present.
	/// On failure the session keeps whatever credential it had before.
	pub async fn authenticate(
		&mut self,
		retriever: Option<&dyn AuthCodeRetriever>,
	) -> Result<&mut Self> {
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.handshake(retriever)).await;

		obs::record_result(KIND, &result);

		let access_token = result?;

		self.credential = Some(Credential { access_token, started_at: OffsetDateTime::now_utc() });
		self.invalidate_expire_time();

		Ok(self)
	}

	async fn handshake(&self, retriever: Option<&dyn AuthCodeRetriever>) -> Result<AccessToken> {
		let retriever = match retriever {
			Some(retriever) => retriever,
			None => self.retriever.as_deref().ok_or(ConfigError::MissingAuthCodeRetriever)?,
		};
		let request_token = self.client.get_request_token(&self.redirect_url).await?;
		let authorize_url = self.client.authorize_url(&request_token);
		let verifier = normalize_verifier(retriever.retrieve(&authorize_url).await?)?;

		self.client.get_access_token(&request_token, &verifier).await
	}

	/// Signed `GET`.
	pub async fn get(&self, path: &str, options: RequestOptions) -> Result<HttpResponse> {
		self.dispatch(Method::GET, path, None, options).await
	}

	/// Signed `POST` with `body`.
	pub async fn post(
		&self,
		path: &str,
		body: impl Into<Vec<u8>>,
		options: RequestOptions,
	) -> Result<HttpResponse> {
		self.dispatch(Method::POST, path, Some(body.into()), options).await
	}

	/// Signed `PUT` with `body`.
	pub async fn put(
		&self,
		path: &str,
		body: impl Into<Vec<u8>>,
		options: RequestOptions,
	) -> Result<HttpResponse> {
		self.dispatch(Method::PUT, path, Some(body.into()), options).await
	}

	/// Signed `DELETE`.
	pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<HttpResponse> {
		self.dispatch(Method::DELETE, path, None, options).await
	}

	async fn dispatch(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
		options: RequestOptions,
	) -> Result<HttpResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let credential = self.credential.as_ref().ok_or(Error::NotAuthenticated)?;
		let url = options.url(self.client.endpoints(), path)?;
		let headers = options.content_type.headers();
		let span = FlowSpan::request(&method, &url);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(self.client.signed_request(
				method,
				url,
				&credential.access_token,
				headers,
				body,
			))
			.await;

		obs::record_result(KIND, &result);

		let response = result?;

		span.record_status(response.status().as_u16());

		check_response(&response);

		Ok(response)
	}

	/// Renews the access token.
	///
	/// Returns `true` when the provider accepted the renewal, which restarts the validity
	/// window. A rejected token is not an error: the start time collapses to the epoch (so the
	/// session reads as expired) and `false` is returned. Any other failure propagates.
	pub async fn renew(&mut self) -> Result<bool> {
		const KIND: FlowKind = FlowKind::Renew;

		let credential = self.credential.as_ref().ok_or(Error::NotAuthenticated)?;
		let url = self.client.endpoints().renew.clone();
		let span = FlowSpan::new(KIND, "renew");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.renew_metrics.record_attempt();

		let result = span
			.instrument(self.client.signed_request(
				Method::GET,
				url,
				&credential.access_token,
				HeaderMap::new(),
				None,
			))
			.await;

		match result {
			Ok(response) => {
				let valid = check_response(&response);

				span.record_status(response.status().as_u16());

				if valid {
					self.restart(OffsetDateTime::now_utc());
				}

				self.renew_metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(valid)
			},
			Err(Error::TokenRejected { .. }) => {
				self.restart(OffsetDateTime::UNIX_EPOCH);
				self.renew_metrics.record_rejection();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Ok(false)
			},
			Err(e) => {
				self.renew_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(e)
			},
		}
	}

	/// Instant after which the session should be treated as expired.
	///
	/// The value is computed once per validity window and memoized; a session without a token
	/// reports the epoch.
	pub fn expire_time(&self) -> OffsetDateTime {
		self.expire_time_at(OffsetDateTime::now_utc())
	}

	/// [`Session::expire_time`] evaluated as if the current instant were `now`.
	pub fn expire_time_at(&self, now: OffsetDateTime) -> OffsetDateTime {
		let Some(credential) = &self.credential else {
			return OffsetDateTime::UNIX_EPOCH;
		};

		*self
			.expire_time
			.lock()
			.get_or_insert_with(|| compute_expire_time(credential.started_at, now))
	}

	/// Remaining validity; negative once expired and zero without a token.
	pub fn time_left(&self) -> Duration {
		self.time_left_at(OffsetDateTime::now_utc())
	}

	/// [`Session::time_left`] evaluated at `now`.
	pub fn time_left_at(&self, now: OffsetDateTime) -> Duration {
		if self.credential.is_none() {
			return Duration::ZERO;
		}

		self.expire_time_at(now) - now
	}

	/// [`Session::time_left`] rendered as `HH:MM:SS`.
	pub fn time_left_pretty(&self) -> String {
		format_clock(self.time_left())
	}

	/// `true` when no validity remains.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// [`Session::is_expired`] evaluated at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.time_left_at(now) <= Duration::ZERO
	}

	/// Captures the persistable state.
	pub fn snapshot(&self) -> PersistedSession {
		PersistedSession {
			access_token: self.access_token().cloned(),
			redirect_url: self.redirect_url.clone(),
			access_token_start_time: self
				.credential
				.as_ref()
				.map(|credential| credential.started_at),
			sandbox: self.is_sandbox(),
		}
	}

	/// Serializes [`Session::snapshot`] to JSON bytes.
	pub fn dump(&self) -> Result<Vec<u8>> {
		Ok(self.snapshot().to_bytes()?)
	}

	fn restart(&mut self, started_at: OffsetDateTime) {
		if let Some(credential) = self.credential.as_mut() {
			credential.started_at = started_at;
		}

		self.invalidate_expire_time();
	}

	fn invalidate_expire_time(&self) {
		*self.expire_time.lock() = None;
	}
}
impl<C> Debug for Session<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("authenticated", &self.is_authenticated())
			.field("time_left", &self.time_left_pretty())
			.field("sandbox", &self.is_sandbox())
			.finish()
	}
}

// HTTP status handling belongs to the caller; every response passes.
fn check_response(_response: &HttpResponse) -> bool {
	true
}

#[cfg(test)]
mod tests {
	// crates.io
	use ::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
	use time::macros::datetime;
	// self
	use super::*;
	use crate::{_preludet::ScriptedTransport, auth::ConsumerCredentials};

	const CONSUMER_KEY: &str = "consumer-key";
	const CONSUMER_SECRET: &str = "consumer-secret";

	fn build(transport: &Arc<ScriptedTransport>) -> Session<ScriptedTransport> {
		Session::builder()
			.consumer_key(CONSUMER_KEY)
			.consumer_secret(CONSUMER_SECRET)
			.redirect_url("oob")
			.sandbox(true)
			.build_with_http_client(transport.clone())
			.expect("Scripted session should build.")
	}

	fn authenticated(
		transport: &Arc<ScriptedTransport>,
		started_at: OffsetDateTime,
	) -> Session<ScriptedTransport> {
		let persisted = PersistedSession {
			access_token: Some(AccessToken::new(
				"access",
				"access-secret",
				ConsumerCredentials::new(CONSUMER_KEY, CONSUMER_SECRET),
			)),
			redirect_url: "oob".into(),
			access_token_start_time: Some(started_at),
			sandbox: true,
		};

		Session::restore(persisted, transport.clone()).expect("Session should restore.")
	}

	#[test]
	fn unauthenticated_sessions_behave_like_the_null_session() {
		let session = build(&Arc::new(ScriptedTransport::new()));

		assert!(session.is_expired());
		assert_eq!(session.time_left(), NULL_SESSION.time_left());
		assert_eq!(session.expire_time(), NULL_SESSION.expire_time());
		assert_eq!(session.time_left_pretty(), "00:00:00");
	}

	#[tokio::test]
	async fn authenticate_requires_a_retriever() {
		let transport = Arc::new(ScriptedTransport::new());
		let mut session = build(&transport);
		let err = session.authenticate(None).await.expect_err("No retriever was configured.");

		assert!(matches!(err, Error::Config(ConfigError::MissingAuthCodeRetriever)));
		assert_eq!(transport.request_count(), 0);
	}

	#[tokio::test]
	async fn authenticate_runs_the_three_legged_handshake() {
		let transport = Arc::new(
			ScriptedTransport::new()
				.reply(
					200,
					"oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
				)
				.reply(200, "oauth_token=access-token&oauth_token_secret=access-secret"),
		);
		let mut session = build(&transport);
		let seen = Mutex::new(None);
		let retriever = |url: &Url| -> Result<String> {
			*seen.lock() = Some(url.to_string());

			Ok("verifier-1".into())
		};
		let before = OffsetDateTime::now_utc();

		session.authenticate(Some(&retriever)).await.expect("Handshake should succeed.");

		let credential = session.credential().expect("Credential should be stored.");

		assert_eq!(
			seen.lock().as_deref(),
			Some("https://us.etrade.com/e/t/etws/authorize?key=consumer-key&token=req-token")
		);
		assert_eq!(credential.access_token.token, "access-token");
		assert_eq!(credential.access_token.consumer.key, CONSUMER_KEY);
		assert!(credential.started_at >= before);
		assert!(!session.is_expired());

		let requests = transport.take_requests();
		let exchange = requests[1]
			.headers()
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.expect("Access-token leg should be signed.");

		assert_eq!(requests[0].uri(), "https://apisb.etrade.com/oauth/request_token");
		assert_eq!(requests[1].uri(), "https://apisb.etrade.com/oauth/access_token");
		assert!(exchange.contains("oauth_verifier=\"verifier-1\""));
		assert!(exchange.contains("oauth_token=\"req-token\""));
	}

	#[tokio::test]
	async fn failed_handshakes_leave_the_credential_untouched() {
		let start = datetime!(2024-05-06 14:00:00 UTC);
		let transport =
			Arc::new(ScriptedTransport::new().reply(401, "oauth_problem=consumer_key_rejected"));
		let mut session = authenticated(&transport, start);
		let retriever = StaticVerifier::new("unused");
		let err = session
			.authenticate(Some(&retriever))
			.await
			.expect_err("Rejected consumer must fail.");

		assert!(matches!(err, Error::InvalidConsumer { .. }));
		assert_eq!(session.credential().map(|credential| credential.started_at), Some(start));
	}

	#[tokio::test]
	async fn verbs_require_authentication() {
		let session = build(&Arc::new(ScriptedTransport::new()));
		let err = session
			.get("/v1/accounts/list", RequestOptions::new())
			.await
			.expect_err("Unauthenticated sessions cannot sign.");

		assert!(matches!(err, Error::NotAuthenticated));
	}

	#[tokio::test]
	async fn get_builds_the_query_and_json_headers() {
		let transport = Arc::new(ScriptedTransport::new().reply(404, "{}"));
		let session = authenticated(&transport, OffsetDateTime::now_utc());
		let response = session
			.get("/v1/accounts/list", RequestOptions::new().query("count", 5))
			.await
			.expect("HTTP errors are passed through.");

		assert_eq!(response.status(), 404);

		let requests = transport.take_requests();
		let request = &requests[0];

		assert_eq!(request.method(), Method::GET);
		assert_eq!(request.uri(), "https://apisb.etrade.com/v1/accounts/list?count=5");
		assert_eq!(request.headers()[ACCEPT], "application/json");
		assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
	}

	#[tokio::test]
	async fn post_and_put_send_bodies_with_xml_headers() {
		let transport = Arc::new(ScriptedTransport::new().reply(200, "<ok/>").reply(200, "<ok/>"));
		let session = authenticated(&transport, OffsetDateTime::now_utc());
		let xml = RequestOptions::new().content_type(ContentType::Xml);

		session.post("/v1/orders", "<order/>", xml.clone()).await.expect("POST should dispatch.");
		session.put("/v1/orders/1", "<order/>", xml).await.expect("PUT should dispatch.");

		let requests = transport.take_requests();

		assert_eq!(requests[0].method(), Method::POST);
		assert_eq!(requests[0].body(), b"<order/>");
		assert_eq!(requests[1].method(), Method::PUT);
		assert_eq!(requests[1].headers()[ACCEPT], "application/xml");
	}

	#[tokio::test]
	async fn renew_success_restarts_the_window() {
		let start = datetime!(2024-05-06 14:00:00 UTC);
		let transport =
			Arc::new(ScriptedTransport::new().reply(200, "Access Token has been renewed"));
		let mut session = authenticated(&transport, start);

		assert!(session.is_expired());
		assert!(session.renew().await.expect("Renewal should succeed."));
		assert!(session.credential().is_some_and(|credential| credential.started_at > start));
		assert!(!session.is_expired());
		assert_eq!(session.renew_metrics().successes(), 1);
	}

	#[tokio::test]
	async fn renew_rejection_expires_the_session() {
		let rejected = ::http::Response::builder()
			.status(401)
			.header(WWW_AUTHENTICATE, "OAuth oauth_problem=\"token_rejected\"")
			.body(Vec::new())
			.expect("Response fixture should build.");
		let transport = Arc::new(ScriptedTransport::new().reply_with(rejected));
		let mut session = authenticated(&transport, OffsetDateTime::now_utc());

		assert!(!session.is_expired());
		assert!(!session.renew().await.expect("Rejections are not errors."));
		assert!(session.is_expired());
		assert_eq!(session.expire_time(), OffsetDateTime::UNIX_EPOCH + Duration::minutes(118));
		assert_eq!(session.renew_metrics().rejections(), 1);
	}

	#[tokio::test]
	async fn renew_propagates_other_failures() {
		let transport = Arc::new(ScriptedTransport::new());
		let start = OffsetDateTime::now_utc();
		let mut session = authenticated(&transport, start);
		let err = session.renew().await.expect_err("Transport failures propagate.");

		assert!(matches!(err, Error::Transport(_)));
		assert_eq!(session.credential().map(|credential| credential.started_at), Some(start));
		assert_eq!(session.renew_metrics().failures(), 1);
	}

	#[test]
	fn expiry_is_memoized_until_the_start_time_changes() {
		let start = datetime!(2024-07-01 14:00:00 UTC);
		let session = authenticated(&Arc::new(ScriptedTransport::new()), start);
		let first = session.expire_time_at(datetime!(2024-07-01 14:05:00 UTC));
		let later = session.expire_time_at(datetime!(2024-07-03 00:00:00 UTC));

		assert_eq!(first, datetime!(2024-07-01 15:58:00 UTC));
		assert_eq!(later, first);
	}

	#[test]
	fn expiry_properties_hold() {
		let now = datetime!(2024-07-01 14:05:00 UTC);
		let start = datetime!(2024-07-01 14:00:00 UTC);
		let session = authenticated(&Arc::new(ScriptedTransport::new()), start);

		assert_eq!(session.time_left_at(now), Duration::minutes(113));
		assert_eq!(session.is_expired_at(now), session.time_left_at(now) <= Duration::ZERO);
		assert!(session.is_expired_at(datetime!(2024-07-01 15:58:00 UTC)));
	}

	#[test]
	fn restore_rejects_unpaired_credentials() {
		let persisted = PersistedSession {
			access_token: None,
			redirect_url: "oob".into(),
			access_token_start_time: Some(OffsetDateTime::UNIX_EPOCH),
			sandbox: false,
		};
		let err = Session::<ScriptedTransport>::restore(persisted, ScriptedTransport::new())
			.expect_err("A start time without a token is unpaired.");

		assert!(matches!(err, Error::Config(ConfigError::UnpairedCredential)));
	}

	#[test]
	fn dump_keeps_token_start_time_and_environment() {
		let start = datetime!(2024-05-06 14:00:00.5 UTC);
		let session = authenticated(&Arc::new(ScriptedTransport::new()), start);
		let snapshot = PersistedSession::from_bytes(&session.dump().expect("Session should dump."))
			.expect("Dump should parse.");

		assert_eq!(snapshot.access_token.map(|token| token.token), Some("access".into()));
		assert_eq!(snapshot.access_token_start_time, Some(start));
		assert_eq!(snapshot.redirect_url, "oob");
		assert!(snapshot.sandbox);
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn reqwest_session_authenticates_against_a_mock_provider() {
		// crates.io
		use httpmock::prelude::*;
		// self
		use crate::_preludet::build_reqwest_test_session;

		let server = MockServer::start_async().await;
		let request_token = server
			.mock_async(|when, then| {
				when.method(GET).path("/oauth/request_token").header_exists("authorization");
				then.status(200).body(
					"oauth_token=req&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
				);
			})
			.await;
		let access_token = server
			.mock_async(|when, then| {
				when.method(GET).path("/oauth/access_token").header_exists("authorization");
				then.status(200).body("oauth_token=acc&oauth_token_secret=acc-secret");
			})
			.await;
		let mut session = build_reqwest_test_session(&server.base_url(), "key", "secret");

		session
			.authenticate(Some(&StaticVerifier::new("verifier")))
			.await
			.expect("Handshake against the mock provider should succeed.");
		request_token.assert_async().await;
		access_token.assert_async().await;

		assert_eq!(session.access_token().map(|token| token.token.as_str()), Some("acc"));
		assert!(!session.is_expired());
	}
}
