//! Optional observability helpers for token and dispatch flows.
//!
//! # Feature Flags
//!
//! - `tracing` wraps `ensure_fresh`, `force_refresh`, `dispatch`, and the `gettoken` exchange
//!   in `wechat_enterprise.flow` spans and logs refresh and retry decisions.
//! - `metrics` counts flow outcomes and rejection-driven dispatch retries.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flows observed by the token manager, the request gate, and suppliers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Staleness-driven refresh started by `ensure_fresh`.
	Refresh,
	/// Refresh that bypassed the freshness check.
	ForcedRefresh,
	/// One endpoint invocation through the request gate.
	Dispatch,
	/// Token exchange performed by a supplier.
	Supply,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Refresh => "refresh",
			FlowKind::ForcedRefresh => "forced_refresh",
			FlowKind::Dispatch => "dispatch",
			FlowKind::Supply => "supply",
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
	/// Entry to a flow.
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		let labels: Vec<_> = [FlowKind::Refresh, FlowKind::ForcedRefresh, FlowKind::Dispatch, FlowKind::Supply]
			.into_iter()
			.map(FlowKind::as_str)
			.collect();

		assert_eq!(labels, ["refresh", "forced_refresh", "dispatch", "supply"]);
		assert_eq!(FlowOutcome::Failure.to_string(), "failure");
	}
}
