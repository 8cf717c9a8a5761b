//! Tag management.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	api::WorkClient,
	auth::UserId,
	http::ApiHttpClient,
	transport::{ApiRequest, TransportErrorMapper},
};

#[derive(Serialize)]
struct CreateBody<'a> {
	tagname: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	tagid: Option<i64>,
}

#[derive(Serialize)]
struct RenameBody<'a> {
	tagid: i64,
	tagname: &'a str,
}

#[derive(Serialize)]
struct MembersBody<'a> {
	tagid: i64,
	userlist: &'a [UserId],
}

/// `POST tag/create`; the platform assigns an id when `tag_id` is `None`.
pub fn create(name: &str, tag_id: Option<i64>) -> Result<ApiRequest> {
	ApiRequest::post_json("tag/create", &CreateBody { tagname: name, tagid: tag_id })
}

/// `POST tag/update`.
pub fn update_name(tag_id: i64, name: &str) -> Result<ApiRequest> {
	ApiRequest::post_json("tag/update", &RenameBody { tagid: tag_id, tagname: name })
}

/// `GET tag/delete`.
pub fn delete(tag_id: i64) -> ApiRequest {
	ApiRequest::get("tag/delete").query("tagid", tag_id)
}

/// `GET tag/list`.
pub fn list() -> ApiRequest {
	ApiRequest::get("tag/list")
}

/// `GET tag/get`.
pub fn get_users(tag_id: i64) -> ApiRequest {
	ApiRequest::get("tag/get").query("tagid", tag_id)
}

/// `POST tag/addtagusers`.
pub fn add_users(tag_id: i64, users: &[UserId]) -> Result<ApiRequest> {
	ApiRequest::post_json("tag/addtagusers", &MembersBody { tagid: tag_id, userlist: users })
}

/// `POST tag/deltagusers`.
pub fn delete_users(tag_id: i64, users: &[UserId]) -> Result<ApiRequest> {
	ApiRequest::post_json("tag/deltagusers", &MembersBody { tagid: tag_id, userlist: users })
}

impl<C, M> WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a tag, optionally with a caller-chosen id.
	pub async fn create_tag(&self, name: &str, tag_id: Option<i64>) -> Result<Value> {
		self.call(create(name, tag_id)?).await
	}

	/// Renames a tag.
	pub async fn update_tag_name(&self, tag_id: i64, name: &str) -> Result<Value> {
		self.call(update_name(tag_id, name)?).await
	}

	/// Deletes a tag.
	pub async fn delete_tag(&self, tag_id: i64) -> Result<Value> {
		self.call(delete(tag_id)).await
	}

	/// Lists every tag.
	pub async fn list_tags(&self) -> Result<Value> {
		self.call(list()).await
	}

	/// Lists a tag's members.
	pub async fn get_tag_users(&self, tag_id: i64) -> Result<Value> {
		self.call(get_users(tag_id)).await
	}

	/// Adds members to a tag. Partially invalid lists succeed with an `invalidlist` field.
	pub async fn add_tag_users(&self, tag_id: i64, users: &[UserId]) -> Result<Value> {
		self.call(add_users(tag_id, users)?).await
	}

	/// Removes members from a tag.
	pub async fn delete_tag_users(&self, tag_id: i64, users: &[UserId]) -> Result<Value> {
		self.call(delete_users(tag_id, users)?).await
	}
}
