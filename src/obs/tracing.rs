// crates.io
use ::http::Method;
// self
use crate::{_prelude::*, http::HttpRequest, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`]; instrumented only with the `tracing` feature.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; instrumented only with the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span wrapping one session operation.
///
/// Spans are named `etrade_oauth.flow` and carry `flow` and `stage`. Signed API calls also
/// record the HTTP `method`, the request `path` (never the query), and the response `status`.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"etrade_oauth.flow",
				flow = kind.as_str(),
				stage,
				method = tracing::field::Empty,
				path = tracing::field::Empty,
				status = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Opens a [`FlowKind::Request`] span describing the outgoing call.
	pub fn request(method: &Method, url: &Url) -> Self {
		let span = Self::new(FlowKind::Request, "dispatch");

		#[cfg(feature = "tracing")]
		{
			span.span.record("method", method.as_str());
			span.span.record("path", url.path());
		}
		#[cfg(not(feature = "tracing"))]
		let _ = (method, url);

		span
	}

	/// Records the provider's HTTP status on the span.
	pub fn record_status(&self, status: u16) {
		#[cfg(feature = "tracing")]
		self.span.record("status", status);
		#[cfg(not(feature = "tracing"))]
		let _ = status;
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `debug` event describing a signed request just before it is sent.
///
/// The `Authorization` header is left out.
pub fn log_outgoing(request: &HttpRequest) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		method = %request.method(),
		uri = %request.uri(),
		headers = ?loggable_headers(request.headers()),
		body = %String::from_utf8_lossy(request.body()),
		"sending signed request"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = request;
}

#[cfg(any(test, feature = "tracing"))]
fn loggable_headers(headers: &::http::HeaderMap) -> Vec<(&str, &str)> {
	headers
		.iter()
		.filter(|(name, _)| **name != ::http::header::AUTHORIZATION)
		.map(|(name, value)| (name.as_str(), value.to_str().unwrap_or("<binary>")))
		.collect()
}
