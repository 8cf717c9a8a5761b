//! Access-token lifecycle: staleness decisions, single-flight refresh, and store republishing.
//!
//! [`TokenManager`] owns the only mutable state in the crate: the current credential and at
//! most one pending refresh. The pending refresh is a shared future, so every caller that finds
//! the credential stale while a refresh is running joins that refresh instead of starting its
//! own, and every joined caller observes the same outcome. Nothing is spawned; the refresh makes
//! progress whenever any joined caller polls it.

pub mod clock;

mod metrics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use metrics::RefreshMetrics;

// std
use std::sync::Weak;
// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialScope},
	error::ConfigError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, FlowStage},
	store::CredentialStore,
	supplier::CredentialSupplier,
};

type RefreshOutcome = std::result::Result<Credential, Arc<Error>>;

// Supplier calls one refresh may spend on grants that are already inside the safety margin.
const MINT_ATTEMPTS: usize = 2;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Refresh policy applied by [`TokenManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenPolicy {
	/// Credentials expiring within this window are treated as stale.
	pub safety_margin: Duration,
}
impl TokenPolicy {
	/// Default safety margin (10 seconds).
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(10);

	/// Overrides the safety margin; negative values clamp to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}
}
impl Default for TokenPolicy {
	fn default() -> Self {
		Self { safety_margin: Self::DEFAULT_SAFETY_MARGIN }
	}
}

struct PendingRefresh {
	id: u64,
	future: SharedRefresh,
}

#[derive(Default)]
struct RefreshState {
	current: Option<Credential>,
	pending: Option<PendingRefresh>,
	last_id: u64,
}

enum Ticket {
	Ready(Credential),
	Wait(SharedRefresh),
}

/// Keeps one application's access token fresh.
///
/// Clones share state, so one manager (and its clones) should exist per application identity.
#[derive(Clone)]
pub struct TokenManager {
	scope: CredentialScope,
	supplier: Arc<dyn CredentialSupplier>,
	store: Arc<dyn CredentialStore>,
	clock: Arc<dyn Clock>,
	policy: TokenPolicy,
	state: Arc<Mutex<RefreshState>>,
	metrics: Arc<RefreshMetrics>,
}
impl TokenManager {
	/// Creates a manager for `scope` using the system clock and the default policy.
	pub fn new(
		scope: CredentialScope,
		supplier: Arc<dyn CredentialSupplier>,
		store: Arc<dyn CredentialStore>,
	) -> Self {
		Self {
			scope,
			supplier,
			store,
			clock: Arc::new(SystemClock),
			policy: TokenPolicy::default(),
			state: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Replaces the clock used for expiry decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the refresh policy.
	pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Scope every credential of this manager belongs to.
	pub fn scope(&self) -> &CredentialScope {
		&self.scope
	}

	/// Active refresh policy.
	pub fn policy(&self) -> TokenPolicy {
		self.policy
	}

	/// Refresh counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Snapshot of the cached credential, fresh or not.
	pub fn current(&self) -> Option<Credential> {
		self.state.lock().current.clone()
	}

	/// Drops the cached credential so the next [`ensure_fresh`](Self::ensure_fresh) consults the
	/// store and, failing that, refreshes. The store is left untouched.
	pub fn invalidate(&self) {
		self.state.lock().current = None;
	}

	/// Returns a credential that stays valid for at least the safety margin.
	///
	/// A fresh cached credential is returned without suspending. Otherwise a fresh credential
	/// saved to the store by another manager is adopted; failing that, the caller joins the
	/// pending refresh or starts one.
	pub async fn ensure_fresh(&self) -> Result<Credential> {
		if let Some(credential) = self.fresh_current(self.clock.now()) {
			return Ok(credential);
		}

		let span = FlowSpan::new(FlowStage::EnsureFresh, &self.scope);

		span.instrument(self.refresh_stale()).await
	}

	/// Refreshes regardless of the cached credential's freshness.
	///
	/// Skips the store lookup and collapses with any refresh already in flight.
	pub async fn force_refresh(&self) -> Result<Credential> {
		self.metrics.record_forced();

		let span = FlowSpan::new(FlowStage::ForceRefresh, &self.scope);

		span.instrument(Self::redeem(self.ticket(FlowKind::ForcedRefresh))).await
	}

	/// Replaces a credential the remote service rejected.
	///
	/// When the cached credential already differs from `rejected` (another caller refreshed in
	/// the meantime) and is still fresh, it is returned without contacting the supplier.
	pub async fn refresh_rejected(&self, rejected: &Credential) -> Result<Credential> {
		let superseding = {
			let now = self.clock.now();
			let state = self.state.lock();

			state
				.current
				.as_ref()
				.filter(|current| {
					!current.same_token(rejected) && current.is_fresh_at(now, self.policy.safety_margin)
				})
				.cloned()
		};

		match superseding {
			Some(credential) => Ok(credential),
			None => self.force_refresh().await,
		}
	}

	async fn refresh_stale(&self) -> Result<Credential> {
		if let Some(stored) = self.store.fetch(&self.scope).await? {
			if stored.is_fresh_at(self.clock.now(), self.policy.safety_margin) {
				return Ok(self.adopt(stored));
			}
		}

		Self::redeem(self.ticket(FlowKind::Refresh)).await
	}

	async fn redeem(ticket: Ticket) -> Result<Credential> {
		match ticket {
			Ticket::Ready(credential) => Ok(credential),
			Ticket::Wait(future) => future.await.map_err(|source| Error::CredentialSupply { source }),
		}
	}

	fn fresh_current(&self, now: OffsetDateTime) -> Option<Credential> {
		self.state
			.lock()
			.current
			.as_ref()
			.filter(|credential| credential.is_fresh_at(now, self.policy.safety_margin))
			.cloned()
	}

	// Stored credentials only replace the cache when they expire later than it.
	fn adopt(&self, candidate: Credential) -> Credential {
		let mut state = self.state.lock();

		if let Some(current) =
			state.current.as_ref().filter(|current| current.expires_at >= candidate.expires_at)
		{
			return current.clone();
		}

		self.metrics.record_adopted();
		state.current = Some(candidate.clone());

		candidate
	}

	fn ticket(&self, kind: FlowKind) -> Ticket {
		let mut state = self.state.lock();

		if let Some(pending) = &state.pending {
			self.metrics.record_join();

			return Ticket::Wait(pending.future.clone());
		}
		if kind == FlowKind::Refresh {
			let now = self.clock.now();

			if let Some(current) =
				state.current.as_ref().filter(|c| c.is_fresh_at(now, self.policy.safety_margin))
			{
				return Ticket::Ready(current.clone());
			}
		}

		state.last_id += 1;

		let id = state.last_id;
		let job = RefreshJob {
			id,
			kind,
			scope: self.scope.clone(),
			supplier: self.supplier.clone(),
			store: self.store.clone(),
			clock: self.clock.clone(),
			margin: self.policy.safety_margin,
			metrics: self.metrics.clone(),
			state: Arc::downgrade(&self.state),
		};
		let future = job.run().boxed().shared();

		state.pending = Some(PendingRefresh { id, future: future.clone() });

		Ticket::Wait(future)
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TokenManager")
			.field("scope", &self.scope)
			.field("policy", &self.policy)
			.field("current", &state.current)
			.field("refreshing", &state.pending.is_some())
			.finish()
	}
}

// Owns everything one refresh needs so the shared future is `'static`. The state is held
// weakly: it owns the pending future, which must not keep its owner alive.
struct RefreshJob {
	id: u64,
	kind: FlowKind,
	scope: CredentialScope,
	supplier: Arc<dyn CredentialSupplier>,
	store: Arc<dyn CredentialStore>,
	clock: Arc<dyn Clock>,
	margin: Duration,
	metrics: Arc<RefreshMetrics>,
	state: Weak<Mutex<RefreshState>>,
}
impl RefreshJob {
	async fn run(self) -> RefreshOutcome {
		self.metrics.record_attempt();
		obs::record_flow_outcome(self.kind, FlowOutcome::Attempt);

		let outcome = self.mint().await.map_err(Arc::new);

		self.publish(&outcome);

		match &outcome {
			Ok(credential) => {
				self.metrics.record_success();
				obs::record_flow_outcome(self.kind, FlowOutcome::Success);

				if let Err(e) = self.store.save(credential.clone()).await {
					self.metrics.record_store_failure();

					#[cfg(feature = "tracing")]
					tracing::warn!(scope = %self.scope, error = %e, "failed to republish credential");
					#[cfg(not(feature = "tracing"))]
					let _ = e;
				}
			},
			Err(_) => {
				self.metrics.record_failure();
				obs::record_flow_outcome(self.kind, FlowOutcome::Failure);
			},
		}

		outcome
	}

	// Waiters only ever receive a credential that is fresh when handed out.
	async fn mint(&self) -> Result<Credential> {
		let mut ttl = Duration::ZERO;

		for _ in 0..MINT_ATTEMPTS {
			let credential = self.mint_once().await?;

			if credential.is_fresh_at(self.clock.now(), self.margin) {
				return Ok(credential);
			}

			ttl = credential.expires_at - credential.issued_at;

			#[cfg(feature = "tracing")]
			tracing::debug!(scope = %self.scope, %ttl, "granted lifetime is inside the safety margin");
		}

		Err(ConfigError::LifetimeWithinMargin { ttl, margin: self.margin }.into())
	}

	async fn mint_once(&self) -> Result<Credential> {
		let issued = self.supplier.mint().await?;
		let issued_at = self.clock.now();
		let expires_at =
			issued_at.checked_add(issued.ttl).ok_or(ConfigError::ExpiresInOutOfRange)?;

		Ok(Credential { scope: self.scope.clone(), token: issued.token, issued_at, expires_at })
	}

	fn publish(&self, outcome: &RefreshOutcome) {
		let Some(state) = self.state.upgrade() else {
			return;
		};
		let mut state = state.lock();

		if state.pending.as_ref().is_some_and(|pending| pending.id == self.id) {
			state.pending = None;
		}
		if let Ok(credential) = outcome {
			state.current = Some(credential.clone());
		}
	}
}
