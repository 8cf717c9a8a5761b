//! [`WorkClient`] and the endpoint groups it exposes.
//!
//! Each submodule holds pure request builders (one function per remote endpoint) plus the
//! matching `WorkClient` methods, which send the built request through the request gate.
//! Results are the decoded `errcode` envelope; the client never interprets endpoint payloads
//! beyond that.

pub mod agent;
pub mod batch;
pub mod ip;
pub mod material;
pub mod shake;
pub mod tag;
pub mod user;

pub use batch::{BatchJob, InviteTargets, TaskCallback};
pub use ip::CallbackIps;
pub use material::MaterialPayload;
pub use user::{AuthorizeScope, UserIdentity};

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::CorpCredentials,
	descriptor::ApiDescriptor,
	http::ApiHttpClient,
	mediator::{RejectionClassifier, RequestMediator},
	store::CredentialStore,
	supplier::CorpSecretSupplier,
	token::TokenManager,
	transport::{ApiRequest, ApiTransport, RawResponse, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, transport::ReqwestTransportErrorMapper};

/// [`WorkClient`] specialized for the default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestWorkClient = WorkClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Client for one corp application.
///
/// Every endpoint method runs through [`RequestMediator::dispatch`], so it carries a fresh
/// access token and is repeated once if the token is rejected.
pub struct WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	transport: ApiTransport<C, M>,
	mediator: RequestMediator,
	credentials: CorpCredentials,
}
impl<C, M> WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wires a client around `http_client`, minting tokens from `credentials` via `gettoken`
	/// and republishing them to `store`.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		descriptor: ApiDescriptor,
		credentials: CorpCredentials,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		let transport = ApiTransport::new(descriptor, http_client, error_mapper);
		let supplier = CorpSecretSupplier::new(credentials.clone(), transport.clone());
		let tokens = TokenManager::new(credentials.scope(), Arc::new(supplier), store);

		Self::from_parts(transport, RequestMediator::new(tokens), credentials)
	}

	/// Assembles a client from prebuilt parts, e.g. a mediator whose token manager uses a
	/// custom clock, policy, or supplier.
	pub fn from_parts(
		transport: ApiTransport<C, M>,
		mediator: RequestMediator,
		credentials: CorpCredentials,
	) -> Self {
		Self { transport, mediator, credentials }
	}

	/// Replaces the rejection classifier used by the request gate.
	pub fn with_classifier(mut self, classifier: Arc<dyn RejectionClassifier>) -> Self {
		self.mediator = self.mediator.with_classifier(classifier);

		self
	}

	/// Request gate every endpoint passes through.
	pub fn mediator(&self) -> &RequestMediator {
		&self.mediator
	}

	/// Token manager backing the request gate.
	pub fn tokens(&self) -> &TokenManager {
		self.mediator.tokens()
	}

	/// Corp credentials the client acts for.
	pub fn credentials(&self) -> &CorpCredentials {
		&self.credentials
	}

	/// Endpoint descriptor.
	pub fn descriptor(&self) -> &ApiDescriptor {
		self.transport.descriptor()
	}

	/// Sends an arbitrary request through the request gate and returns the decoded envelope.
	pub async fn call(&self, request: ApiRequest) -> Result<Value> {
		let transport = &self.transport;
		let request = &request;

		self.mediator
			.dispatch(move |credential| async move {
				transport.call(request, Some(&credential.token)).await
			})
			.await
	}

	/// Like [`call`](Self::call), deserializing the envelope into `T`.
	pub async fn call_as<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		crate::transport::decode_value(self.call(request).await?)
	}

	/// Sends a request through the request gate without decoding the body.
	///
	/// JSON envelopes are still checked for `errcode` so rejected tokens trigger the retry.
	pub async fn call_raw(&self, request: ApiRequest) -> Result<RawResponse> {
		let transport = &self.transport;
		let request = &request;

		self.mediator
			.dispatch(move |credential| async move {
				let raw = transport.execute(request, Some(&credential.token)).await?;

				match raw.api_error() {
					Some(err) => Err(Error::Api(err)),
					None => Ok(raw),
				}
			})
			.await
	}
}
#[cfg(feature = "reqwest")]
impl WorkClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a reqwest-backed client with default HTTP settings.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		descriptor: ApiDescriptor,
		credentials: CorpCredentials,
	) -> Self {
		Self::with_http_client(
			store,
			descriptor,
			credentials,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Debug for WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WorkClient")
			.field("descriptor", self.transport.descriptor())
			.field("corp_id", &self.credentials.corp_id)
			.field("mediator", &self.mediator)
			.finish()
	}
}
