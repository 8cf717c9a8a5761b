// std
use std::{net::TcpListener, time::Duration as StdDuration};
// self
use wechat_enterprise_api::{
	_preludet::*,
	api::WorkClient,
	auth::{CorpCredentials, CorpId},
	error::{ConfigError, Error, TransportError},
	http::{ApiHttpClient, ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	store::{CredentialStore, MemoryStore},
	transport::{ReqwestTransportErrorMapper, TransportErrorMapper},
};

#[derive(Debug)]
enum FakeTransportError {
	Overloaded,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Overloaded => write!(f, "Gateway overloaded."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
struct FakeHttpClient;
impl ApiHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			assert!(request.uri().path().ends_with("/gettoken"));

			slot.store(ResponseMetadata {
				status: Some(503),
				content_type: Some("text/html".into()),
			});

			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Overloaded)))
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	metadata: Arc<Mutex<Vec<Option<ResponseMetadata>>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded_metadata(&self) -> Vec<Option<ResponseMetadata>> {
		self.metadata.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<FakeTransportError>,
	) -> Error {
		self.metadata.lock().push(metadata.cloned());

		match error {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			other => TransportError::Other { message: format!("{other:?}") }.into(),
		}
	}
}

fn build_client(
	mapper: Arc<RecordingTransportErrorMapper>,
) -> WorkClient<FakeHttpClient, RecordingTransportErrorMapper> {
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let credentials = CorpCredentials::new(
		CorpId::new("ww-fake-transport").expect("Corp identifier fixture should be valid."),
		"fake-secret",
	);

	WorkClient::with_http_client(
		store,
		test_descriptor("https://qyapi.example.com"),
		credentials,
		FakeHttpClient,
		mapper,
	)
}

#[tokio::test]
async fn custom_transport_failures_reach_the_caller() {
	let client = build_client(Arc::new(RecordingTransportErrorMapper::default()));
	let err = client.list_agents().await.expect_err("The fake transport always fails.");
	let cause = err.supply_cause().expect("Token minting should be the failing step.");

	match &**cause {
		Error::Transport(TransportError::Network { source }) => {
			assert_eq!(source.to_string(), "Gateway overloaded.");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn mapper_observes_response_metadata() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let client = build_client(mapper.clone());
	let _ = client.list_agents().await.expect_err("The fake transport always fails.");
	let observed = mapper.recorded_metadata();

	assert_eq!(observed.len(), 1, "Mapper must record a single request.");

	let meta = observed
		.first()
		.and_then(|value| value.clone())
		.expect("Response metadata should be recorded exactly once.");

	assert_eq!(meta.status, Some(503));
	assert!(!meta.is_envelope());
}

#[tokio::test]
async fn client_deadline_surfaces_as_a_timeout() {
	// Connections queue in the backlog but are never accepted, so the TLS handshake stalls.
	let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind a silent listener.");
	let port = listener.local_addr().expect("Listener should expose its address.").port();
	let http_client = ReqwestHttpClient::with_timeout(StdDuration::from_millis(200))
		.expect("A client with a deadline should build.");
	let client: ReqwestTestClient = WorkClient::with_http_client(
		Arc::new(MemoryStore::default()),
		test_descriptor(&format!("https://127.0.0.1:{port}")),
		CorpCredentials::new(
			CorpId::new("ww-silent-gateway").expect("Corp identifier fixture should be valid."),
			"silent-secret",
		),
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	);
	let err = tokio::time::timeout(StdDuration::from_secs(5), client.list_agents())
		.await
		.expect("The client deadline should fire before the test deadline.")
		.expect_err("A silent gateway never answers.");
	let cause = err.supply_cause().expect("Token minting should be the failing step.");

	assert!(
		matches!(&**cause, Error::Transport(TransportError::Timeout { .. })),
		"Unexpected error variant: {cause:?}."
	);

	drop(listener);
}
