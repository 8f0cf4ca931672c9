//! OAuth 1.0a session lifecycle for the E*Trade API: three-legged login, day-boundary aware
//! expiry, renewal, persistable sessions, and a null session for the unauthenticated case.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	#[cfg(feature = "reqwest")]
	use crate::{
		http::ReqwestHttpClient,
		provider::{Environment, ProviderEndpoints},
		session::Session,
	};
	use crate::{
		error::TransportError,
		http::{HttpRequest, HttpResponse, HttpTransport, TransportFuture},
	};

	/// Session type alias used by reqwest-backed tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestSession = Session<ReqwestHttpClient>;

	/// Transport double that replays queued responses in order and records every request.
	///
	/// Once the queue is empty, further requests fail with a transport error.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		requests: Mutex<Vec<HttpRequest>>,
		responses: Mutex<VecDeque<HttpResponse>>,
	}
	impl ScriptedTransport {
		/// Creates a transport with an empty response queue.
		pub fn new() -> Self {
			Self::default()
		}

		/// Queues a response with `status` and a UTF-8 `body`.
		pub fn reply(self, status: u16, body: &str) -> Self {
			let mut response = HttpResponse::new(body.as_bytes().to_vec());

			*response.status_mut() =
				::http::StatusCode::from_u16(status).unwrap_or(::http::StatusCode::OK);

			self.reply_with(response)
		}

		/// Queues a prepared response.
		pub fn reply_with(self, response: HttpResponse) -> Self {
			self.responses.lock().push_back(response);

			self
		}

		/// Number of requests executed so far.
		pub fn request_count(&self) -> usize {
			self.requests.lock().len()
		}

		/// Drains the recorded requests.
		pub fn take_requests(&self) -> Vec<HttpRequest> {
			std::mem::take(&mut *self.requests.lock())
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			self.requests.lock().push(request);

			let next = self.responses.lock().pop_front();

			Box::pin(async move {
				next.ok_or_else(|| {
					TransportError::Io(std::io::Error::other("no scripted response left")).into()
				})
			})
		}
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Derives sandbox-shaped endpoints rooted at a mock server base URL.
	#[cfg(feature = "reqwest")]
	pub fn mock_endpoints(base_url: &str) -> ProviderEndpoints {
		let base = Url::parse(base_url).expect("Failed to parse mock server base URL.");
		let authorize =
			base.join("/e/t/etws/authorize").expect("Failed to derive mock authorize URL.");

		ProviderEndpoints::rooted_at(base, authorize)
			.expect("Failed to derive mock provider endpoints.")
	}

	/// Constructs a [`Session`] against the provided mock server using the reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_session(
		base_url: &str,
		consumer_key: &str,
		consumer_secret: &str,
	) -> ReqwestTestSession {
		Session::builder()
			.consumer_key(consumer_key)
			.consumer_secret(consumer_secret)
			.redirect_url("oob")
			.environment(Environment::Sandbox)
			.endpoints(mock_endpoints(base_url))
			.build_with_http_client(test_reqwest_http_client())
			.expect("Failed to build reqwest-backed test session.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
