//! Wall-clock sources for expiry decisions.

// self
use crate::_prelude::*;

/// Source of the current instant.
///
/// Expiry instants are wall-clock values because credentials may be persisted in stores that
/// outlive the process.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// [`Clock`] backed by the system's UTC time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven [`Clock`] for deterministic tests and simulations.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Starts the clock at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(instant)))
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Jumps the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
