//! Provider strategy hooks that customize token requests.
//!
//! Implementations decorate outgoing token requests and normalize error mapping
//! without tying the handshake to any particular HTTP client.

// self
use crate::_prelude::*;

/// Strategy hook that allows providers to decorate requests and classify errors.
///
/// Implementors are required to be `Send + Sync`, and the hooks use crate-owned data types
/// so downstream crates never depend on transport-specific structures. Override only what
/// you need; `augment_token_request` has a default no-op implementation.
pub trait ProviderStrategy: Send + Sync {
	/// Maps a failed token-endpoint exchange into the crate taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Gives providers a chance to add extra signed parameters before dispatching.
	///
	/// Parameters added here are sent in the query string and therefore take part in the
	/// signature base string.
	fn augment_token_request(&self, _step: TokenStep, _params: &mut BTreeMap<String, String>) {}
}

/// Token endpoints involved in the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStep {
	/// First leg: obtain temporary credentials.
	RequestToken,
	/// Third leg: trade the verifier for an access token.
	AccessToken,
}
impl TokenStep {
	/// Returns a stable label for logs and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenStep::RequestToken => "request_token",
			TokenStep::AccessToken => "access_token",
		}
	}
}
impl Display for TokenStep {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider refused the token (expired, revoked, unknown, or bad verifier).
	TokenRejected,
	/// Provider refused the consumer key or signature.
	InvalidConsumer,
	/// Failure is temporary; authentication may be retried from scratch.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
///
/// The struct keeps only primitive data (status code, OAuth problem code, body preview) so
/// strategies stay decoupled from any HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Token endpoint associated with the failing request.
	pub step: TokenStep,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// `oauth_problem` value from the Problem Reporting extension, if reported.
	pub oauth_problem: Option<String>,
	/// Preview of the response body.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided token step.
	pub fn new(step: TokenStep) -> Self {
		Self { step, http_status: None, oauth_problem: None, body_preview: None }
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the `oauth_problem` code reported by the provider.
	pub fn with_oauth_problem(mut self, problem: impl Into<String>) -> Self {
		self.oauth_problem = Some(problem.into());

		self
	}

	/// Adds a body preview, truncated to a bounded length.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default strategy built on the OAuth Problem Reporting vocabulary.
///
/// It prioritizes the structured `oauth_problem` code, then body text hints, and finally the
/// HTTP status code.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if let Some(kind) = ctx.oauth_problem.as_deref().and_then(classify_problem) {
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.step, ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= ProviderErrorContext::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

fn classify_problem(problem: &str) -> Option<ProviderErrorKind> {
	match problem.to_ascii_lowercase().as_str() {
		"token_rejected" | "token_expired" | "token_revoked" | "token_used" | "permission_denied"
		| "permission_unknown" | "verifier_invalid" => Some(ProviderErrorKind::TokenRejected),
		"consumer_key_unknown"
		| "consumer_key_rejected"
		| "consumer_key_refused"
		| "signature_invalid"
		| "signature_method_rejected"
		| "nonce_used"
		| "timestamp_refused"
		| "parameter_absent"
		| "parameter_rejected"
		| "version_rejected" => Some(ProviderErrorKind::InvalidConsumer),
		_ => None,
	}
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let body = body?;
	let lowered = body.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("token_rejected") || text.contains("token_expired") =>
			Some(ProviderErrorKind::TokenRejected),
		text if text.contains("consumer_key_") || text.contains("signature_invalid") =>
			Some(ProviderErrorKind::InvalidConsumer),
		text if text.contains("temporarily unavailable") || text.contains("retry") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(step: TokenStep, status: Option<u16>) -> ProviderErrorKind {
	match (step, status) {
		(TokenStep::AccessToken, Some(400 | 401)) => ProviderErrorKind::TokenRejected,
		(TokenStep::RequestToken, Some(400 | 401)) => ProviderErrorKind::InvalidConsumer,
		(_, Some(403)) => ProviderErrorKind::InvalidConsumer,
		_ => ProviderErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn problem_codes_take_priority() {
		let strategy = DefaultProviderStrategy;
		let ctx = ProviderErrorContext::new(TokenStep::RequestToken)
			.with_http_status(401)
			.with_oauth_problem("token_rejected");

		assert_eq!(strategy.classify_token_error(&ctx), ProviderErrorKind::TokenRejected);

		let ctx = ProviderErrorContext::new(TokenStep::AccessToken)
			.with_http_status(401)
			.with_oauth_problem("signature_invalid");

		assert_eq!(strategy.classify_token_error(&ctx), ProviderErrorKind::InvalidConsumer);
	}

	#[test]
	fn falls_back_to_body_then_status() {
		let strategy = DefaultProviderStrategy;
		let body_ctx = ProviderErrorContext::new(TokenStep::RequestToken)
			.with_http_status(500)
			.with_body_preview("oauth_problem=consumer_key_rejected");

		assert_eq!(strategy.classify_token_error(&body_ctx), ProviderErrorKind::InvalidConsumer);

		let status_ctx = ProviderErrorContext::new(TokenStep::AccessToken).with_http_status(401);

		assert_eq!(strategy.classify_token_error(&status_ctx), ProviderErrorKind::TokenRejected);

		let outage_ctx = ProviderErrorContext::new(TokenStep::AccessToken).with_http_status(503);

		assert_eq!(strategy.classify_token_error(&outage_ctx), ProviderErrorKind::Transient);
	}

	#[test]
	fn body_preview_is_truncated() {
		let ctx = ProviderErrorContext::new(TokenStep::RequestToken).with_body_preview("x".repeat(300));
		let preview = ctx.body_preview.expect("Preview should be recorded.");

		assert_eq!(preview.chars().count(), ProviderErrorContext::BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
