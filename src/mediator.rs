//! The gate every endpoint invocation passes through.
//!
//! [`RequestMediator::dispatch`] attaches a fresh credential to an endpoint call and, when the
//! remote service rejects that credential, refreshes once and repeats the call once. Whether a
//! remote failure counts as a rejection is decided by an injected [`RejectionClassifier`].

// std
use std::{
	collections::BTreeSet,
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::ApiError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, FlowStage},
	token::TokenManager,
};

/// Decides whether a remote failure means the attached credential was rejected.
pub trait RejectionClassifier
where
	Self: Send + Sync,
{
	/// Returns `true` when `error` reports an invalid or expired access token.
	fn is_rejection(&self, error: &ApiError) -> bool;
}
impl<F> RejectionClassifier for F
where
	F: Send + Sync + Fn(&ApiError) -> bool,
{
	fn is_rejection(&self, error: &ApiError) -> bool {
		self(error)
	}
}

/// Classifier matching a fixed set of `errcode` values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrcodeClassifier {
	codes: BTreeSet<i64>,
}
impl ErrcodeClassifier {
	/// `errcode` values the platform uses for rejected access tokens: `40001` (invalid
	/// credential), `40014` (invalid access token), and `42001` (access token expired).
	pub const DEFAULT_CODES: [i64; 3] = [40001, 40014, 42001];

	/// Builds a classifier for the provided codes.
	pub fn with_codes(codes: impl IntoIterator<Item = i64>) -> Self {
		Self { codes: codes.into_iter().collect() }
	}

	/// Codes treated as rejections.
	pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
		self.codes.iter().copied()
	}
}
impl Default for ErrcodeClassifier {
	fn default() -> Self {
		Self::with_codes(Self::DEFAULT_CODES)
	}
}
impl RejectionClassifier for ErrcodeClassifier {
	fn is_rejection(&self, error: &ApiError) -> bool {
		self.codes.contains(&error.code)
	}
}

/// Thread-safe counters for dispatched calls.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	calls: AtomicU64,
	retries: AtomicU64,
	rejections: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the number of `dispatch` invocations.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// Returns how many endpoint calls were repeated after a rejection.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns how many dispatches ended with [`Error::CredentialRejected`].
	pub fn rejections(&self) -> u64 {
		self.rejections.load(Ordering::Relaxed)
	}

	fn record_call(&self) {
		self.calls.fetch_add(1, Ordering::Relaxed);
	}

	fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	fn record_rejection(&self) {
		self.rejections.fetch_add(1, Ordering::Relaxed);
	}
}

/// Runs endpoint calls with a fresh credential and a single refresh-and-retry on rejection.
#[derive(Clone)]
pub struct RequestMediator {
	tokens: TokenManager,
	classifier: Arc<dyn RejectionClassifier>,
	metrics: Arc<DispatchMetrics>,
}
impl RequestMediator {
	/// Creates a mediator using the default [`ErrcodeClassifier`].
	pub fn new(tokens: TokenManager) -> Self {
		Self {
			tokens,
			classifier: Arc::new(ErrcodeClassifier::default()),
			metrics: Default::default(),
		}
	}

	/// Replaces the rejection classifier.
	pub fn with_classifier(mut self, classifier: Arc<dyn RejectionClassifier>) -> Self {
		self.classifier = classifier;

		self
	}

	/// Token manager backing this mediator.
	pub fn tokens(&self) -> &TokenManager {
		&self.tokens
	}

	/// Dispatch counters.
	pub fn metrics(&self) -> &DispatchMetrics {
		&self.metrics
	}

	/// Invokes `endpoint` with a fresh credential.
	///
	/// If the credential cannot be obtained, the error is returned and `endpoint` is never
	/// called. If `endpoint` fails with a rejection, the credential is refreshed and `endpoint`
	/// is called exactly once more; a second rejection yields [`Error::CredentialRejected`].
	/// Every other outcome is returned unchanged.
	pub async fn dispatch<F, Fut, T>(&self, mut endpoint: F) -> Result<T>
	where
		F: FnMut(Credential) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		const KIND: FlowKind = FlowKind::Dispatch;

		let span = FlowSpan::new(FlowStage::Dispatch, self.tokens.scope());

		self.metrics.record_call();
		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let credential = self.tokens.ensure_fresh().await?;
				let rejected = match endpoint(credential.clone()).await {
					Err(Error::Api(err)) if self.classifier.is_rejection(&err) => err,
					other => return other,
				};

				#[cfg(feature = "tracing")]
				tracing::debug!(code = rejected.code, "credential rejected; refreshing once");
				obs::record_dispatch_retry(rejected.code);

				let refreshed = self.tokens.refresh_rejected(&credential).await?;

				self.metrics.record_retry();

				match endpoint(refreshed).await {
					Err(Error::Api(err)) if self.classifier.is_rejection(&err) => {
						self.metrics.record_rejection();

						Err(Error::CredentialRejected { code: err.code, message: err.message })
					},
					other => other,
				}
			})
			.await;

		obs::record_flow_result(KIND, &result);

		result
	}
}
impl Debug for RequestMediator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestMediator")
			.field("tokens", &self.tokens)
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::AtomicUsize;
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::{
		auth::{CorpId, CredentialScope, TokenSecret},
		error::TransportError,
		store::MemoryStore,
		supplier::{CredentialSupplier, IssuedToken, SupplyFuture},
	};

	#[derive(Default)]
	struct CountingSupplier(AtomicUsize);
	impl CredentialSupplier for CountingSupplier {
		fn mint(&self) -> SupplyFuture<'_> {
			let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;

			Box::pin(async move { Ok(IssuedToken::new(format!("T{n}"), Duration::hours(2))) })
		}
	}

	// Grants a zero lifetime on its first call, two hours afterwards.
	#[derive(Default)]
	struct ExpiredFirstSupplier(AtomicUsize);
	impl CredentialSupplier for ExpiredFirstSupplier {
		fn mint(&self) -> SupplyFuture<'_> {
			let n = self.0.fetch_add(1, Ordering::SeqCst);
			let ttl = if n == 0 { Duration::ZERO } else { Duration::hours(2) };

			Box::pin(async move { Ok(IssuedToken::new(format!("T{n}"), ttl)) })
		}
	}

	fn scope() -> CredentialScope {
		CredentialScope::new(
			CorpId::new("ww-mediator-unit").expect("Corp fixture should be valid."),
			&TokenSecret::new("corp-secret"),
		)
	}

	fn mediator() -> (RequestMediator, Arc<CountingSupplier>) {
		let supplier = Arc::new(CountingSupplier::default());
		let tokens = TokenManager::new(scope(), supplier.clone(), Arc::new(MemoryStore::default()));

		(RequestMediator::new(tokens), supplier)
	}

	#[test]
	fn default_classifier_covers_token_codes() {
		let classifier = ErrcodeClassifier::default();

		assert!(classifier.is_rejection(&ApiError::new(40014, "invalid access_token")));
		assert!(classifier.is_rejection(&ApiError::new(42001, "access_token expired")));
		assert!(classifier.is_rejection(&ApiError::new(40001, "invalid credential")));
		assert!(!classifier.is_rejection(&ApiError::new(60011, "no privilege")));
	}

	#[test]
	fn rejection_refreshes_and_retries_once() {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for mediator test.");
		let (mediator, supplier) = mediator();
		let mut seen = Vec::new();
		let value = rt
			.block_on(mediator.dispatch(|credential| {
				seen.push(credential.token.expose().to_owned());

				let token = credential.token.expose().to_owned();

				async move {
					if token == "T1" { Err(Error::Api(ApiError::new(42001, "expired"))) } else { Ok(token) }
				}
			}))
			.expect("Retry with the refreshed credential should succeed.");

		assert_eq!(value, "T2");
		assert_eq!(seen, ["T1", "T2"]);
		assert_eq!(supplier.0.load(Ordering::SeqCst), 2);
		assert_eq!(mediator.metrics().retries(), 1);
		assert_eq!(mediator.tokens().metrics().forced(), 1);
	}

	#[test]
	fn second_rejection_is_fatal() {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for mediator test.");
		let (mediator, supplier) = mediator();
		let mut attempts = 0;
		let err = rt
			.block_on(mediator.dispatch(|_| {
				attempts += 1;

				async { Err::<(), _>(Error::Api(ApiError::new(40014, "invalid access_token"))) }
			}))
			.expect_err("Repeated rejection should fail.");

		assert!(matches!(err, Error::CredentialRejected { code: 40014, .. }));
		assert_eq!(attempts, 2);
		assert_eq!(supplier.0.load(Ordering::SeqCst), 2);
		assert_eq!(mediator.metrics().rejections(), 1);
	}

	#[test]
	fn other_failures_pass_through_without_refresh() {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for mediator test.");
		let (mediator, supplier) = mediator();
		let api = rt
			.block_on(mediator.dispatch(|_| async {
				Err::<(), _>(Error::Api(ApiError::new(60111, "userid not found")))
			}))
			.expect_err("Endpoint error should surface.");
		let transport = rt
			.block_on(mediator.dispatch(|_| async {
				Err::<(), _>(Error::Transport(TransportError::Other { message: "connection reset".into() }))
			}))
			.expect_err("Transport error should surface.");

		assert_eq!(api.api_error(), Some(&ApiError::new(60111, "userid not found")));
		assert!(matches!(transport, Error::Transport(_)));
		assert_eq!(supplier.0.load(Ordering::SeqCst), 1);
		assert_eq!(mediator.metrics().retries(), 0);
	}

	#[test]
	fn endpoints_never_see_an_expired_credential() {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for mediator test.");
		let supplier = Arc::new(ExpiredFirstSupplier::default());
		let tokens = TokenManager::new(scope(), supplier.clone(), Arc::new(MemoryStore::default()));
		let mediator = RequestMediator::new(tokens);
		let (token, valid) = rt
			.block_on(mediator.dispatch(|credential| async move {
				let valid = credential.is_valid_at(OffsetDateTime::now_utc());

				Ok::<_, Error>((credential.token.expose().to_owned(), valid))
			}))
			.expect("Dispatch should succeed once a usable grant arrives.");

		assert_eq!(token, "T1");
		assert!(valid);
		assert_eq!(supplier.0.load(Ordering::SeqCst), 2);
		assert_eq!(mediator.metrics().retries(), 0);
	}

	#[test]
	fn closures_can_classify_rejections() {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for mediator test.");
		let (mediator, supplier) = mediator();
		let mediator = mediator.with_classifier(Arc::new(|err: &ApiError| err.code == 40082));
		let mut attempts = 0;
		let result = rt.block_on(mediator.dispatch(|_| {
			attempts += 1;

			let attempt = attempts;

			async move {
				if attempt == 1 { Err(Error::Api(ApiError::new(40082, "custom"))) } else { Ok(attempt) }
			}
		}));

		assert_eq!(result.expect("Custom rejection should be retried."), 2);
		assert_eq!(supplier.0.load(Ordering::SeqCst), 2);
	}
}
