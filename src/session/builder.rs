// self
use crate::{
	_prelude::*,
	auth::ConsumerCredentials,
	http::HttpTransport,
	oauth::{OAuth1Client, SignatureMethod},
	provider::{
		DefaultProviderStrategy, Environment, ProviderEndpoints, ProviderQuirks, ProviderStrategy,
	},
	session::{AuthCodeRetriever, Session},
};
#[cfg(feature = "reqwest")] use crate::{http::ReqwestHttpClient, session::ReqwestSession};

/// Errors raised while validating a [`SessionBuilder`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum SessionBuildError {
	/// Consumer key is required.
	#[error("Missing consumer key.")]
	MissingConsumerKey,
	/// Consumer secret is required.
	#[error("Missing consumer secret.")]
	MissingConsumerSecret,
	/// Redirect URL (or `oob`) is required.
	#[error("Missing redirect URL; use `oob` for out-of-band verification.")]
	MissingRedirectUrl,
	/// Endpoint family could not be derived.
	#[error("Provider endpoints could not be derived: {message}.")]
	Endpoints {
		/// Human-readable error payload.
		message: String,
	},
}

/// Builder for [`Session`] values.
pub struct SessionBuilder {
	consumer_key: Option<String>,
	consumer_secret: Option<String>,
	redirect_url: Option<String>,
	environment: Environment,
	endpoints: Option<ProviderEndpoints>,
	quirks: ProviderQuirks,
	signature_method: SignatureMethod,
	strategy: Arc<dyn ProviderStrategy>,
	retriever: Option<Arc<dyn AuthCodeRetriever>>,
}
impl SessionBuilder {
	/// Creates a builder targeting production with the default strategy and quirks.
	pub fn new() -> Self {
		Self {
			consumer_key: None,
			consumer_secret: None,
			redirect_url: None,
			environment: Environment::default(),
			endpoints: None,
			quirks: ProviderQuirks::default(),
			signature_method: SignatureMethod::default(),
			strategy: Arc::new(DefaultProviderStrategy),
			retriever: None,
		}
	}

	/// Sets the consumer key.
	pub fn consumer_key(mut self, key: impl Into<String>) -> Self {
		self.consumer_key = Some(key.into());

		self
	}

	/// Sets the consumer secret.
	pub fn consumer_secret(mut self, secret: impl Into<String>) -> Self {
		self.consumer_secret = Some(secret.into());

		self
	}

	/// Sets the OAuth callback target sent as `oauth_callback`.
	pub fn redirect_url(mut self, url: impl Into<String>) -> Self {
		self.redirect_url = Some(url.into());

		self
	}

	/// Selects the endpoint family.
	pub fn environment(mut self, environment: Environment) -> Self {
		self.environment = environment;

		self
	}

	/// Selects sandbox (`true`) or production (`false`).
	pub fn sandbox(self, sandbox: bool) -> Self {
		self.environment(Environment::from_sandbox(sandbox))
	}

	/// Overrides the endpoints derived from the environment.
	///
	/// The environment is still recorded (and persisted) as selected.
	pub fn endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
		self.endpoints = Some(endpoints);

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Overrides the signature method.
	pub fn signature_method(mut self, method: SignatureMethod) -> Self {
		self.signature_method = method;

		self
	}

	/// Overrides the token-endpoint error classification strategy.
	pub fn strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Sets the default retriever used by [`Session::authenticate`].
	pub fn retriever(mut self, retriever: impl 'static + AuthCodeRetriever) -> Self {
		self.retriever = Some(Arc::new(retriever));

		self
	}

	/// Validates the configuration and binds it to `http_client`.
	pub fn build_with_http_client<C>(
		self,
		http_client: impl Into<Arc<C>>,
	) -> Result<Session<C>, SessionBuildError>
	where
		C: ?Sized + HttpTransport,
	{
		let key = self
			.consumer_key
			.filter(|key| !key.is_empty())
			.ok_or(SessionBuildError::MissingConsumerKey)?;
		let secret = self.consumer_secret.ok_or(SessionBuildError::MissingConsumerSecret)?;
		let redirect_url = self
			.redirect_url
			.filter(|url| !url.is_empty())
			.ok_or(SessionBuildError::MissingRedirectUrl)?;
		let endpoints = match self.endpoints {
			Some(endpoints) => endpoints,
			None => self
				.environment
				.endpoints()
				.map_err(|e| SessionBuildError::Endpoints { message: e.to_string() })?,
		};
		let client = OAuth1Client::new(
			ConsumerCredentials::new(key, secret),
			endpoints,
			self.quirks,
			self.signature_method,
			self.strategy,
			http_client,
		);

		Ok(Session::from_parts(client, self.environment, redirect_url, self.retriever, None))
	}

	/// Validates the configuration using the default reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn build(self) -> Result<ReqwestSession, SessionBuildError> {
		self.build_with_http_client(ReqwestHttpClient::default())
	}
}
impl Default for SessionBuilder {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for SessionBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionBuilder")
			.field("consumer_key", &self.consumer_key)
			.field("consumer_secret_set", &self.consumer_secret.is_some())
			.field("redirect_url", &self.redirect_url)
			.field("environment", &self.environment)
			.field("endpoints", &self.endpoints)
			.field("signature_method", &self.signature_method)
			.field("retriever_set", &self.retriever.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::ScriptedTransport;

	fn complete() -> SessionBuilder {
		Session::builder().consumer_key("key").consumer_secret("secret").redirect_url("oob")
	}

	#[test]
	fn missing_fields_are_reported() {
		let err = Session::builder()
			.consumer_secret("secret")
			.redirect_url("oob")
			.build_with_http_client(ScriptedTransport::new())
			.expect_err("Consumer key is mandatory.");

		assert_eq!(err, SessionBuildError::MissingConsumerKey);

		let err = Session::builder()
			.consumer_key("key")
			.redirect_url("oob")
			.build_with_http_client(ScriptedTransport::new())
			.expect_err("Consumer secret is mandatory.");

		assert_eq!(err, SessionBuildError::MissingConsumerSecret);

		let err = Session::builder()
			.consumer_key("key")
			.consumer_secret("secret")
			.build_with_http_client(ScriptedTransport::new())
			.expect_err("Redirect URL is mandatory.");

		assert_eq!(err, SessionBuildError::MissingRedirectUrl);
	}

	#[test]
	fn sandbox_flag_selects_the_endpoint_family() {
		let session = complete()
			.sandbox(true)
			.build_with_http_client(ScriptedTransport::new())
			.expect("Sandbox session should build.");

		assert!(session.is_sandbox());
		assert_eq!(session.endpoints().base.as_str(), "https://apisb.etrade.com/");

		let session = complete()
			.build_with_http_client(ScriptedTransport::new())
			.expect("Production session should build.");

		assert!(!session.is_sandbox());
		assert_eq!(session.endpoints().base.as_str(), "https://api.etrade.com/");
	}

	#[test]
	fn debug_output_hides_the_secret() {
		let rendered = format!("{:?}", complete().consumer_secret("do-not-print"));

		assert!(!rendered.contains("do-not-print"));
	}
}
