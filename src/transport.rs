//! Request execution against the remote API and `errcode` envelope decoding.

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError,
	http::{Method, Request, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	descriptor::ApiDescriptor,
	error::{ApiError, ConfigError, TransportError},
	http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

const BODY_PREVIEW_LIMIT: usize = 256;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) =>
				if inner.is_builder() {
					ConfigError::from(*inner).into()
				} else {
					TransportError::from(*inner).into()
				},
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unclassified failure"),
		}
	}
}

/// HTTP verb used by an [`ApiRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiMethod {
	/// Query-string only call.
	Get,
	/// Call carrying a JSON body.
	Post,
}
impl ApiMethod {
	fn as_http(self) -> Method {
		match self {
			Self::Get => Method::GET,
			Self::Post => Method::POST,
		}
	}
}

/// One remote call, described without the access token the gate attaches later.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: ApiMethod,
	/// Path relative to the descriptor's API base, e.g. `user/get`.
	pub path: Cow<'static, str>,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// JSON body for `POST` calls.
	pub body: Option<Value>,
}
impl ApiRequest {
	/// Describes a `GET` call.
	pub fn get(path: impl Into<Cow<'static, str>>) -> Self {
		Self { method: ApiMethod::Get, path: path.into(), query: Vec::new(), body: None }
	}

	/// Describes a `POST` call with a prebuilt JSON body.
	pub fn post(path: impl Into<Cow<'static, str>>, body: Value) -> Self {
		Self { method: ApiMethod::Post, path: path.into(), query: Vec::new(), body: Some(body) }
	}

	/// Describes a `POST` call, serializing `body` to JSON.
	pub fn post_json<T>(path: impl Into<Cow<'static, str>>, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_value(body).map_err(|source| ConfigError::RequestBody { source })?;

		Ok(Self::post(path, body))
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Appends a query parameter when `value` is present.
	pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
		match value {
			Some(value) => self.query(key, value),
			None => self,
		}
	}
}

/// Undecoded response returned by [`ApiTransport::execute`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header value, if present.
	pub content_type: Option<String>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Returns `true` when the body should be read as an `errcode` envelope.
	pub fn is_envelope(&self) -> bool {
		ResponseMetadata { status: Some(self.status), content_type: self.content_type.clone() }
			.is_envelope()
	}

	/// Returns the remote failure carried by an envelope body, if any.
	///
	/// Non-envelope bodies (binary downloads) never carry one.
	pub fn api_error(&self) -> Option<ApiError> {
		if !self.is_envelope() {
			return None;
		}

		serde_json::from_slice::<Value>(&self.body).ok().as_ref().and_then(envelope_error)
	}

	/// Decodes the `errcode` envelope, surfacing a non-zero code as [`Error::Api`].
	pub fn into_envelope(self) -> Result<Value> {
		let success = (200..300).contains(&self.status);
		let mut de = serde_json::Deserializer::from_slice(&self.body);
		let value = match serde_path_to_error::deserialize::<_, Value>(&mut de) {
			Ok(value) => value,
			Err(_) if !success => return Err(self.unexpected_status().into()),
			Err(source) => {
				return Err(TransportError::Decode { source, status: Some(self.status) }.into());
			},
		};

		if let Some(err) = envelope_error(&value) {
			return Err(err.into());
		}
		if !success {
			return Err(self.unexpected_status().into());
		}

		Ok(value)
	}

	fn unexpected_status(&self) -> TransportError {
		let preview = String::from_utf8_lossy(&self.body);

		TransportError::UnexpectedStatus {
			status: self.status,
			body_preview: preview.chars().take(BODY_PREVIEW_LIMIT).collect(),
		}
	}
}

/// Executes [`ApiRequest`]s against an [`ApiDescriptor`] through a pluggable HTTP client.
pub struct ApiTransport<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	descriptor: Arc<ApiDescriptor>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> ApiTransport<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a transport for `descriptor`.
	pub fn new(
		descriptor: ApiDescriptor,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			descriptor: Arc::new(descriptor),
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		}
	}

	/// Descriptor the transport resolves paths against.
	pub fn descriptor(&self) -> &ApiDescriptor {
		&self.descriptor
	}

	/// Sends `request`, attaching `token` as the `access_token` query parameter when present.
	pub async fn execute(
		&self,
		request: &ApiRequest,
		token: Option<&TokenSecret>,
	) -> Result<RawResponse> {
		let url = self.resolve(request, token)?;
		let mut builder = Request::builder().method(request.method.as_http()).uri(url.as_str());
		let body = match &request.body {
			Some(body) => {
				builder = builder.header(CONTENT_TYPE, "application/json");

				serde_json::to_vec(body).map_err(|source| ConfigError::RequestBody { source })?
			},
			None => Vec::new(),
		};
		let http_request = builder.body(body).map_err(ConfigError::from)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let response = handle
			.call(http_request)
			.await
			.map_err(|err| self.error_mapper.map_transport_error(slot.take().as_ref(), err))?;
		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(ToOwned::to_owned);

		Ok(RawResponse { status: response.status().as_u16(), content_type, body: response.into_body() })
	}

	/// Sends `request` and decodes the `errcode` envelope.
	pub async fn call(&self, request: &ApiRequest, token: Option<&TokenSecret>) -> Result<Value> {
		self.execute(request, token).await?.into_envelope()
	}

	/// Sends `request` and deserializes the envelope into `T`.
	pub async fn call_as<T>(&self, request: &ApiRequest, token: Option<&TokenSecret>) -> Result<T>
	where
		T: DeserializeOwned,
	{
		decode_value(self.call(request, token).await?)
	}

	fn resolve(&self, request: &ApiRequest, token: Option<&TokenSecret>) -> Result<Url> {
		let mut url = self.descriptor.endpoint(&request.path)?;

		if token.is_some() || !request.query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			if let Some(token) = token {
				pairs.append_pair("access_token", token.expose());
			}
			for (key, value) in &request.query {
				pairs.append_pair(key, value);
			}
		}

		Ok(url)
	}
}
impl<C, M> Clone for ApiTransport<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			descriptor: self.descriptor.clone(),
			http_client: self.http_client.clone(),
			error_mapper: self.error_mapper.clone(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a reqwest-backed transport with default client settings.
	pub fn reqwest(descriptor: ApiDescriptor) -> Self {
		Self::new(descriptor, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}

/// Deserializes an envelope into `T`, keeping the failing JSON path.
pub fn decode_value<T>(value: Value) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value)
		.map_err(|source| TransportError::Decode { source, status: None }.into())
}

/// Extracts the remote failure from an envelope, if `errcode` is present and non-zero.
///
/// The service sometimes encodes `errcode` as a string, so both shapes are accepted.
pub fn envelope_error(value: &Value) -> Option<ApiError> {
	let code = match value.get("errcode")? {
		Value::Number(number) => number.as_i64()?,
		Value::String(text) => text.trim().parse().ok()?,
		_ => return None,
	};

	if code == 0 {
		return None;
	}

	let message = value.get("errmsg").and_then(Value::as_str).unwrap_or_default();

	Some(ApiError::new(code, message))
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	match meta.and_then(|meta| meta.status) {
		Some(status) => TransportError::Other {
			message: format!("{message} (HTTP status {status})"),
		}
		.into(),
		None => TransportError::Other { message: message.to_string() }.into(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn raw(status: u16, content_type: &str, body: &str) -> RawResponse {
		RawResponse {
			status,
			content_type: Some(content_type.into()),
			body: body.as_bytes().to_vec(),
		}
	}

	#[test]
	fn envelope_error_reads_numeric_and_string_codes() {
		assert_eq!(
			envelope_error(&json!({ "errcode": 40014, "errmsg": "invalid access_token" })),
			Some(ApiError::new(40014, "invalid access_token"))
		);
		assert_eq!(
			envelope_error(&json!({ "errcode": "42001", "errmsg": "expired" })),
			Some(ApiError::new(42001, "expired"))
		);
		assert_eq!(envelope_error(&json!({ "errcode": 0, "errmsg": "ok" })), None);
		assert_eq!(envelope_error(&json!({ "userid": "zhangsan" })), None);
	}

	#[test]
	fn non_zero_errcode_becomes_api_error() {
		let err = raw(200, "application/json", r#"{"errcode":60111,"errmsg":"userid not found"}"#)
			.into_envelope()
			.expect_err("Non-zero errcode should fail.");

		assert_eq!(err.api_error(), Some(&ApiError::new(60111, "userid not found")));
	}

	#[test]
	fn success_envelope_is_returned_whole() {
		let value = raw(200, "text/plain", r#"{"errcode":0,"errmsg":"ok","tagid":12}"#)
			.into_envelope()
			.expect("Zero errcode should succeed.");

		assert_eq!(value["tagid"], 12);
	}

	#[test]
	fn binary_bodies_never_carry_api_errors() {
		let mut download = raw(200, "image/jpeg", "");

		download.body = vec![0xff, 0xd8, 0xff];

		assert_eq!(download.api_error(), None);
		assert_eq!(
			raw(200, "application/json; charset=utf-8", r#"{"errcode":40014,"errmsg":"bad"}"#).api_error(),
			Some(ApiError::new(40014, "bad"))
		);
	}

	#[test]
	fn malformed_body_is_a_decode_error() {
		let err = raw(200, "application/json", "{not json")
			.into_envelope()
			.expect_err("Malformed JSON should fail.");

		assert!(matches!(err, Error::Transport(TransportError::Decode { status: Some(200), .. })));
	}

	#[test]
	fn non_success_status_without_envelope_is_unexpected() {
		let err = raw(502, "text/html", "<html>bad gateway</html>")
			.into_envelope()
			.expect_err("Gateway failure should surface.");

		assert!(matches!(
			err,
			Error::Transport(TransportError::UnexpectedStatus { status: 502, ref body_preview })
				if body_preview.contains("bad gateway")
		));
	}

	#[test]
	fn request_builder_keeps_query_order() {
		let request = ApiRequest::get("user/get")
			.query("userid", "zhangsan")
			.query_opt("agentid", Some(7))
			.query_opt("fetch_child", None::<u8>);

		assert_eq!(request.method, ApiMethod::Get);
		assert_eq!(
			request.query,
			vec![("userid".into(), "zhangsan".into()), ("agentid".into(), "7".into())]
		);
	}

	#[test]
	fn decode_value_reports_the_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Payload {
			#[allow(dead_code)]
			tagid: i64,
		}

		let err = decode_value::<Payload>(json!({ "tagid": "twelve" }))
			.expect_err("Wrong type should fail.");

		match err {
			Error::Transport(TransportError::Decode { source, .. }) =>
				assert_eq!(source.path().to_string(), "tagid"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
