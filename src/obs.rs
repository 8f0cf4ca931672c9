//! Optional observability helpers for session operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `etrade_oauth.flow` with the `flow`
//!   (operation) and `stage` (call site) fields. Signed calls add `method`, `path`, and
//!   `status`, and log a `debug` event for every outgoing request.
//! - Enable `metrics` to increment the `etrade_oauth_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.
//!
//! Neither layer ever records token or consumer secrets or the `Authorization` header.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Session operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Three-legged handshake.
	Authenticate,
	/// Access-token renewal.
	Renew,
	/// Signed API request.
	Request,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authenticate => "authenticate",
			FlowKind::Renew => "renew",
			FlowKind::Request => "request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a session operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the terminal outcome of `result` for `kind`.
pub fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

	record_flow_outcome(kind, outcome);
}
