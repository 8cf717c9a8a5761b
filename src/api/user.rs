//! Member directory and OAuth sign-in helpers.

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	api::WorkClient,
	auth::UserId,
	http::ApiHttpClient,
	transport::{ApiRequest, TransportErrorMapper},
};

/// Scope requested on the OAuth authorize page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthorizeScope {
	/// Silent redirect that yields only the member identity.
	#[default]
	Base,
	/// Consent page that also exposes profile details.
	UserInfo,
}
impl AuthorizeScope {
	/// Wire value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Base => "snsapi_base",
			Self::UserInfo => "snsapi_userinfo",
		}
	}
}

/// Identity resolved from an OAuth `code`.
///
/// Corp members come back with `UserId`; visitors outside the directory with `OpenId`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserIdentity {
	/// Member identifier.
	#[serde(rename = "UserId", default)]
	pub user_id: Option<UserId>,
	/// Device identifier of the signing-in client.
	#[serde(rename = "DeviceId", default)]
	pub device_id: Option<String>,
	/// Identifier for non-members.
	#[serde(rename = "OpenId", default)]
	pub open_id: Option<String>,
}

/// `POST user/create`.
pub fn create<T>(user: &T) -> Result<ApiRequest>
where
	T: ?Sized + Serialize,
{
	ApiRequest::post_json("user/create", user)
}

/// `POST user/update`.
pub fn update<T>(user: &T) -> Result<ApiRequest>
where
	T: ?Sized + Serialize,
{
	ApiRequest::post_json("user/update", user)
}

/// `GET user/delete`.
pub fn delete(user_id: &UserId) -> ApiRequest {
	ApiRequest::get("user/delete").query("userid", user_id)
}

/// `POST user/batchdelete`.
pub fn delete_many(user_ids: &[UserId]) -> ApiRequest {
	ApiRequest::post("user/batchdelete", json!({ "useridlist": user_ids }))
}

/// `GET user/get`.
pub fn get(user_id: &UserId) -> ApiRequest {
	ApiRequest::get("user/get").query("userid", user_id)
}

/// `GET user/simplelist`.
pub fn department_users(department_id: i64, fetch_child: bool, status: u8) -> ApiRequest {
	department_query("user/simplelist", department_id, fetch_child, status)
}

/// `GET user/list`.
pub fn department_users_detail(department_id: i64, fetch_child: bool, status: u8) -> ApiRequest {
	department_query("user/list", department_id, fetch_child, status)
}

/// `POST invite/send`.
pub fn invite(user_id: &UserId, tips: &str) -> ApiRequest {
	ApiRequest::post("invite/send", json!({ "userid": user_id, "invite_tips": tips }))
}

/// `GET user/getuserinfo`.
pub fn user_id_by_code(code: &str, agent_id: Option<i64>) -> ApiRequest {
	ApiRequest::get("user/getuserinfo").query("code", code).query_opt("agentid", agent_id)
}

fn department_query(
	path: &'static str,
	department_id: i64,
	fetch_child: bool,
	status: u8,
) -> ApiRequest {
	ApiRequest::get(path)
		.query("department_id", department_id)
		.query("fetch_child", u8::from(fetch_child))
		.query("status", status)
}

impl<C, M> WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Adds a member.
	pub async fn create_user<T>(&self, user: &T) -> Result<Value>
	where
		T: ?Sized + Serialize,
	{
		self.call(create(user)?).await
	}

	/// Updates a member; only the provided fields change.
	pub async fn update_user<T>(&self, user: &T) -> Result<Value>
	where
		T: ?Sized + Serialize,
	{
		self.call(update(user)?).await
	}

	/// Removes a member.
	pub async fn delete_user(&self, user_id: &UserId) -> Result<Value> {
		self.call(delete(user_id)).await
	}

	/// Removes several members at once.
	pub async fn delete_users(&self, user_ids: &[UserId]) -> Result<Value> {
		self.call(delete_many(user_ids)).await
	}

	/// Fetches a member's profile.
	pub async fn get_user(&self, user_id: &UserId) -> Result<Value> {
		self.call(get(user_id)).await
	}

	/// Lists a department's members (ids and names).
	///
	/// `status` is a bit set: `1` followed, `2` disabled, `4` not yet followed; `0` means all.
	pub async fn get_department_users(
		&self,
		department_id: i64,
		fetch_child: bool,
		status: u8,
	) -> Result<Value> {
		self.call(department_users(department_id, fetch_child, status)).await
	}

	/// Lists a department's members with full profiles.
	pub async fn get_department_users_detail(
		&self,
		department_id: i64,
		fetch_child: bool,
		status: u8,
	) -> Result<Value> {
		self.call(department_users_detail(department_id, fetch_child, status)).await
	}

	/// Sends a member an invitation to follow the corp account.
	pub async fn invite_user(&self, user_id: &UserId, tips: &str) -> Result<Value> {
		self.call(invite(user_id, tips)).await
	}

	/// Resolves the OAuth `code` delivered to the redirect URI.
	pub async fn get_user_id_by_code(&self, code: &str) -> Result<UserIdentity> {
		self.call_as(user_id_by_code(code, self.credentials().agent_id)).await
	}

	/// Builds the authorize page URL members are sent to for OAuth sign-in.
	///
	/// Pure: no network call and no access token involved.
	pub fn authorize_url(&self, redirect: &Url, state: Option<&str>, scope: AuthorizeScope) -> Url {
		let mut url = self.descriptor().authorize_endpoint.clone();

		url.query_pairs_mut()
			.clear()
			.append_pair("appid", self.credentials().corp_id.as_ref())
			.append_pair("redirect_uri", redirect.as_str())
			.append_pair("response_type", "code")
			.append_pair("scope", scope.as_str())
			.append_pair("state", state.unwrap_or_default());
		url.set_fragment(Some("wechat_redirect"));

		url
	}
}
