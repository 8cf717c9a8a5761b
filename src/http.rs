//! Transport primitives for remote API calls.
//!
//! The module exposes [`ApiHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can plug in custom HTTP clients while the
//! transport layer still sees status codes and content types when classifying failures.
//! Implementations call [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once the response head is known.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::AsyncHttpClient;
#[cfg(feature = "reqwest")] use oauth2::{HttpClientError, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::header::CONTENT_TYPE;
// self
use crate::_prelude::*;

/// Abstraction over HTTP transports able to execute API calls while publishing response
/// metadata to the transport layer.
///
/// This trait is the crate's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so one transport can back the token supplier and every endpoint
/// call at once, and the handles they return must own whatever state their request futures
/// need so those futures stay `Send` while in flight.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = oauth2::HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across the retry the request gate may issue.
	/// - Once the response head arrives, save it with [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Metadata captured from the most recent HTTP response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code, if available.
	pub status: Option<u16>,
	/// `Content-Type` header value, if present.
	pub content_type: Option<String>,
}
impl ResponseMetadata {
	/// Returns `true` when the response declared a textual envelope body.
	///
	/// The service labels some JSON envelopes as `text/plain`, so both count.
	pub fn is_envelope(&self) -> bool {
		self.content_type.as_deref().is_some_and(|value| {
			value.split(';').next().is_some_and(|mime| {
				let mime = mime.trim();

				mime.eq_ignore_ascii_case("application/json") || mime.eq_ignore_ascii_case("text/plain")
			})
		})
	}
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose requests fail after `timeout`.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		InstrumentedHandle(Arc::new(InstrumentedHttpClient { client: self.0.clone(), slot }))
	}
}

#[cfg(feature = "reqwest")]
struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient`] that records response metadata.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let inner = Arc::clone(&self.0);

		Box::pin(async move {
			inner.slot.take();

			let response = inner
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let content_type =
				headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(str::to_owned);

			inner.slot.store(ResponseMetadata { status: Some(status.as_u16()), content_type });

			let mut converted =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn slot_take_clears_previous_metadata() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(200), content_type: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(200));
		assert!(slot.take().is_none());
	}

	#[test]
	fn envelope_detection_ignores_parameters_and_case() {
		let json = ResponseMetadata {
			status: Some(200),
			content_type: Some("Application/JSON; charset=utf-8".into()),
		};
		let binary =
			ResponseMetadata { status: Some(200), content_type: Some("image/jpeg".into()) };

		assert!(json.is_envelope());
		assert!(!binary.is_envelope());
		assert!(!ResponseMetadata::default().is_envelope());
	}
}
