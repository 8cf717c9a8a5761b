//! Spans opened by the public token and dispatch entry points.
//!
//! Every span is named `wechat_enterprise.flow`. Its `flow` field holds the [`FlowKind`] label
//! and `stage` the entry point that opened it. `scope` shows the corp id with a secret
//! fingerprint prefix; tokens and secrets never reach a span.

// self
use crate::{_prelude::*, auth::CredentialScope, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Entry point that opened a flow span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// `TokenManager::ensure_fresh` found no fresh credential.
	EnsureFresh,
	/// `TokenManager::force_refresh`.
	ForceRefresh,
	/// `RequestMediator::dispatch`.
	Dispatch,
	/// The `gettoken` exchange issued by a supplier.
	GetToken,
}
impl FlowStage {
	/// Flow this stage belongs to.
	pub const fn kind(self) -> FlowKind {
		match self {
			FlowStage::EnsureFresh => FlowKind::Refresh,
			FlowStage::ForceRefresh => FlowKind::ForcedRefresh,
			FlowStage::Dispatch => FlowKind::Dispatch,
			FlowStage::GetToken => FlowKind::Supply,
		}
	}

	/// Returns the `stage` field value.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStage::EnsureFresh => "ensure_fresh",
			FlowStage::ForceRefresh => "force_refresh",
			FlowStage::Dispatch => "dispatch",
			FlowStage::GetToken => "gettoken",
		}
	}
}

/// Span covering one stage of a token or dispatch flow.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens the span for `stage` on behalf of `scope`.
	pub fn new(stage: FlowStage, scope: &CredentialScope) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"wechat_enterprise.flow",
				flow = stage.kind().as_str(),
				stage = stage.as_str(),
				scope = %scope
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, scope);

			Self {}
		}
	}

	/// Runs `fut` inside the span without holding a guard across `.await` points.
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
