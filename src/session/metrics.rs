// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for renewal attempts.
#[derive(Debug, Default)]
pub struct RenewMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	rejected: AtomicU64,
	failure: AtomicU64,
}
impl RenewMetrics {
	/// Returns the total number of renewal attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals the provider accepted.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals the provider rejected (the token is now expired).
	pub fn rejections(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals that failed for any other reason.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejection(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
