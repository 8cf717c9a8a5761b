//! Counters for the token and dispatch flows.
//!
//! - `wechat_enterprise_flow_total{flow, outcome}` counts every refresh, forced refresh,
//!   dispatch, and `gettoken` exchange, once on entry and once on completion.
//! - `wechat_enterprise_dispatch_retry_total{errcode}` counts rejections that made a dispatch
//!   refresh its credential and call the endpoint again.

// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"wechat_enterprise_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records the completion of a flow from its result.
pub fn record_flow_result<T, E>(kind: FlowKind, result: &Result<T, E>) {
	record_flow_outcome(kind, completion_outcome(result));
}

/// Records a dispatch retry triggered by the remote `errcode`.
pub fn record_dispatch_retry(code: i64) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("wechat_enterprise_dispatch_retry_total", "errcode" => code.to_string())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = code;
	}
}

fn completion_outcome<T, E>(result: &Result<T, E>) -> FlowOutcome {
	if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
}
