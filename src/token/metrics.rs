// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token refreshes.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	joins: AtomicU64,
	forced: AtomicU64,
	adopted: AtomicU64,
	store_failures: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the number of supplier calls started.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that produced a credential.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes whose supplier call failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how many callers joined a refresh another caller had already started.
	pub fn joins(&self) -> u64 {
		self.joins.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes requested without a freshness check.
	pub fn forced(&self) -> u64 {
		self.forced.load(Ordering::Relaxed)
	}

	/// Returns how many credentials were taken from the store instead of minted.
	pub fn adopted(&self) -> u64 {
		self.adopted.load(Ordering::Relaxed)
	}

	/// Returns how many minted credentials could not be republished to the store.
	pub fn store_failures(&self) -> u64 {
		self.store_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_forced(&self) {
		self.forced.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_adopted(&self) {
		self.adopted.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_store_failure(&self) {
		self.store_failures.fetch_add(1, Ordering::Relaxed);
	}
}
