//! Crate-level error types shared by the session, signing, and storage layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session snapshot storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Persisted session state could not be written or read.
	#[error(transparent)]
	Persist(#[from] PersistError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry from scratch.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Provider reported the token as rejected, expired, or otherwise unusable.
	#[error("Provider rejected the token: {problem}.")]
	TokenRejected {
		/// OAuth problem code (e.g. `token_rejected`) or provider-supplied reason.
		problem: String,
	},
	/// Provider refused the consumer key or signature.
	#[error("Consumer authentication failed: {reason}.")]
	InvalidConsumer {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// The authorization code retriever could not produce a verifier.
	#[error("Authorization code retrieval failed: {reason}.")]
	Retriever {
		/// Retriever-supplied reason string.
		reason: String,
	},
	/// A signed request was attempted before the session was authenticated.
	#[error("Session has no access token; authenticate first.")]
	NotAuthenticated,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// An endpoint or request URL could not be parsed.
	#[error("Endpoint URL `{url}` is invalid.")]
	InvalidEndpoint {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},

	/// HMAC signing key was rejected by the MAC implementation.
	#[error("OAuth signing key is invalid.")]
	InvalidSigningKey,

	/// Content type name other than `json` or `xml`.
	#[error("Do not understand header type: {name:?}.")]
	UnknownHeaderType {
		/// Name that failed to parse.
		name: String,
	},
	/// Neither the builder nor the `authenticate` call supplied a retriever.
	#[error("No authorization code retriever was supplied.")]
	MissingAuthCodeRetriever,
	/// Persisted state carries an access token without a start time (or the reverse).
	#[error("Persisted access token and start time must be present together.")]
	UnpairedCredential,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	pub(crate) fn invalid_endpoint(url: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidEndpoint { url: url.into(), source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry from scratch).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or crate-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with a form body that lacks the expected fields.
	#[error("Token endpoint response is missing `{field}`.")]
	TokenResponseParse {
		/// Missing form field.
		field: &'static str,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures while dumping or loading persisted session state.
#[derive(Debug, ThisError)]
pub enum PersistError {
	/// Session state could not be serialized.
	#[error("Session state could not be serialized.")]
	Serialize(#[source] serde_json::Error),
	/// Persisted bytes could not be parsed; the path points at the offending field.
	#[error("Persisted session state is malformed at `{path}`.")]
	Deserialize {
		/// Dotted path to the field that failed.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for PersistError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Deserialize { path, source: e.into_inner() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unknown_header_type_names_the_input() {
		let err: Error = ConfigError::UnknownHeaderType { name: "yaml".into() }.into();

		assert!(matches!(err, Error::Config(ConfigError::UnknownHeaderType { .. })));
		assert_eq!(err.to_string(), "Do not understand header type: \"yaml\".");
	}

	#[test]
	fn path_aware_parse_errors_keep_the_path() {
		let mut de = serde_json::Deserializer::from_str("{\"sandbox\":\"yes\"}");
		let parsed: std::result::Result<BTreeMap<String, bool>, _> =
			serde_path_to_error::deserialize(&mut de);
		let err = PersistError::from(parsed.expect_err("String is not a boolean."));

		assert!(matches!(&err, PersistError::Deserialize { path, .. } if path == "sandbox"));
	}
}
