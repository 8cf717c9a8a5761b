//! Permanent material (media library) management.

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	api::WorkClient,
	http::ApiHttpClient,
	transport::{ApiRequest, RawResponse, TransportErrorMapper},
};

const DEFAULT_BATCH_COUNT: u32 = 10;

/// Body returned by `material/get`: article lists come back as JSON, files as bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialPayload {
	/// Decoded envelope (mpnews materials).
	Json(Value),
	/// Raw file contents.
	Binary {
		/// `Content-Type` reported by the platform.
		content_type: Option<String>,
		/// File bytes.
		bytes: Vec<u8>,
	},
}
impl MaterialPayload {
	/// Classifies a raw response by its content type.
	pub fn from_raw(raw: RawResponse) -> Result<Self> {
		if raw.is_envelope() || !(200..300).contains(&raw.status) {
			return raw.into_envelope().map(Self::Json);
		}

		Ok(Self::Binary { content_type: raw.content_type, bytes: raw.body })
	}
}

#[derive(Serialize)]
struct MpnewsBody<'a, T>
where
	T: ?Sized,
{
	agentid: i64,
	#[serde(skip_serializing_if = "Option::is_none")]
	media_id: Option<&'a str>,
	mpnews: &'a T,
}

/// `POST material/add_mpnews`.
pub fn add_mpnews<T>(agent_id: i64, mpnews: &T) -> Result<ApiRequest>
where
	T: ?Sized + Serialize,
{
	ApiRequest::post_json(
		"material/add_mpnews",
		&MpnewsBody { agentid: agent_id, media_id: None, mpnews },
	)
}

/// `POST material/update_mpnews`.
pub fn update_mpnews<T>(agent_id: i64, media_id: &str, mpnews: &T) -> Result<ApiRequest>
where
	T: ?Sized + Serialize,
{
	ApiRequest::post_json(
		"material/update_mpnews",
		&MpnewsBody { agentid: agent_id, media_id: Some(media_id), mpnews },
	)
}

/// `GET material/get`.
pub fn get(agent_id: i64, media_id: &str) -> ApiRequest {
	ApiRequest::get("material/get").query("media_id", media_id).query("agentid", agent_id)
}

/// `GET material/del`.
pub fn delete(agent_id: i64, media_id: &str) -> ApiRequest {
	ApiRequest::get("material/del").query("media_id", media_id).query("agentid", agent_id)
}

/// `GET material/get_count`.
pub fn count(agent_id: i64) -> ApiRequest {
	ApiRequest::get("material/get_count").query("agentid", agent_id)
}

/// `POST material/batchget`; `count` defaults to 10.
pub fn batch_get(agent_id: i64, kind: &str, offset: u32, count: Option<u32>) -> ApiRequest {
	ApiRequest::post(
		"material/batchget",
		json!({
			"type": kind,
			"agentid": agent_id,
			"offset": offset,
			"count": count.unwrap_or(DEFAULT_BATCH_COUNT),
		}),
	)
}

impl<C, M> WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a permanent article list.
	pub async fn add_mpnews<T>(&self, agent_id: i64, mpnews: &T) -> Result<Value>
	where
		T: ?Sized + Serialize,
	{
		self.call(add_mpnews(agent_id, mpnews)?).await
	}

	/// Replaces a permanent article list.
	pub async fn update_mpnews<T>(&self, agent_id: i64, media_id: &str, mpnews: &T) -> Result<Value>
	where
		T: ?Sized + Serialize,
	{
		self.call(update_mpnews(agent_id, media_id, mpnews)?).await
	}

	/// Downloads a material; files come back as bytes.
	pub async fn get_material(&self, agent_id: i64, media_id: &str) -> Result<MaterialPayload> {
		MaterialPayload::from_raw(self.call_raw(get(agent_id, media_id)).await?)
	}

	/// Deletes a material.
	pub async fn delete_material(&self, agent_id: i64, media_id: &str) -> Result<Value> {
		self.call(delete(agent_id, media_id)).await
	}

	/// Counts materials per type.
	pub async fn count_material(&self, agent_id: i64) -> Result<Value> {
		self.call(count(agent_id)).await
	}

	/// Lists materials of one type (`image`, `voice`, `video`, `file`, `mpnews`).
	pub async fn batch_get_material(
		&self,
		agent_id: i64,
		kind: &str,
		offset: u32,
		count: Option<u32>,
	) -> Result<Value> {
		self.call(batch_get(agent_id, kind, offset, count)).await
	}
}
