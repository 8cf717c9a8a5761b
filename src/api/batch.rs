//! Asynchronous directory jobs.
//!
//! Sync and replace jobs read a CSV file previously uploaded as temporary media; the
//! platform answers with a job id that [`WorkClient::batch_get_result`] polls.

// crates.io
use serde::Serializer;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	api::WorkClient,
	auth::UserId,
	http::ApiHttpClient,
	transport::{ApiRequest, TransportErrorMapper},
};

/// Members, departments, and tags to invite. Lists are sent `|`-joined.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InviteTargets {
	/// Members to invite.
	#[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "join_ids")]
	pub touser: Vec<UserId>,
	/// Departments whose members are invited.
	#[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "join_ids")]
	pub toparty: Vec<i64>,
	/// Tags whose members are invited.
	#[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "join_ids")]
	pub totag: Vec<i64>,
	/// Message shown in the invitation.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub invite_tips: Option<String>,
}

/// Endpoint the platform notifies once a job finishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskCallback {
	/// Callback URL.
	pub url: String,
	/// Token used to sign the notification.
	pub token: String,
	/// Key used to encrypt the notification.
	pub encodingaeskey: String,
}

/// Job handle returned by batch endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BatchJob {
	/// Identifier to poll with [`WorkClient::batch_get_result`].
	pub jobid: String,
}

#[derive(Serialize)]
struct InviteBody<'a> {
	#[serde(flatten)]
	targets: &'a InviteTargets,
	#[serde(skip_serializing_if = "Option::is_none")]
	callback: Option<&'a TaskCallback>,
}

#[derive(Serialize)]
struct MediaJobBody<'a> {
	media_id: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	callback: Option<&'a TaskCallback>,
}

/// `POST batch/inviteuser`.
pub fn invite_user(targets: &InviteTargets, callback: Option<&TaskCallback>) -> Result<ApiRequest> {
	ApiRequest::post_json("batch/inviteuser", &InviteBody { targets, callback })
}

/// `POST batch/syncuser`.
pub fn sync_user(media_id: &str, callback: Option<&TaskCallback>) -> Result<ApiRequest> {
	ApiRequest::post_json("batch/syncuser", &MediaJobBody { media_id, callback })
}

/// `POST batch/replaceuser`.
pub fn replace_user(media_id: &str, callback: Option<&TaskCallback>) -> Result<ApiRequest> {
	ApiRequest::post_json("batch/replaceuser", &MediaJobBody { media_id, callback })
}

/// `POST batch/replaceparty`.
pub fn replace_party(media_id: &str, callback: Option<&TaskCallback>) -> Result<ApiRequest> {
	ApiRequest::post_json("batch/replaceparty", &MediaJobBody { media_id, callback })
}

/// `GET batch/getresult`.
pub fn get_result(job_id: &str) -> ApiRequest {
	ApiRequest::get("batch/getresult").query("jobid", job_id)
}

fn join_ids<I, S>(ids: I, serializer: S) -> Result<S::Ok, S::Error>
where
	I: IntoIterator,
	I::Item: Display,
	S: Serializer,
{
	let joined = ids.into_iter().map(|id| id.to_string()).collect::<Vec<_>>().join("|");

	serializer.serialize_str(&joined)
}

impl<C, M> WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Invites members to follow the corp account.
	pub async fn batch_invite_user(
		&self,
		targets: &InviteTargets,
		callback: Option<&TaskCallback>,
	) -> Result<BatchJob> {
		self.call_as(invite_user(targets, callback)?).await
	}

	/// Adds or updates members from an uploaded CSV.
	pub async fn batch_sync_user(
		&self,
		media_id: &str,
		callback: Option<&TaskCallback>,
	) -> Result<BatchJob> {
		self.call_as(sync_user(media_id, callback)?).await
	}

	/// Replaces the member directory with an uploaded CSV.
	pub async fn batch_replace_user(
		&self,
		media_id: &str,
		callback: Option<&TaskCallback>,
	) -> Result<BatchJob> {
		self.call_as(replace_user(media_id, callback)?).await
	}

	/// Replaces the department tree with an uploaded CSV.
	pub async fn batch_replace_party(
		&self,
		media_id: &str,
		callback: Option<&TaskCallback>,
	) -> Result<BatchJob> {
		self.call_as(replace_party(media_id, callback)?).await
	}

	/// Polls a job's progress and per-row results.
	pub async fn batch_get_result(&self, job_id: &str) -> Result<Value> {
		self.call(get_result(job_id)).await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn callback() -> TaskCallback {
		TaskCallback {
			url: "https://corp.example.com/jobs".into(),
			token: "cb-token".into(),
			encodingaeskey: "aes-key".into(),
		}
	}

	#[test]
	fn invite_targets_are_pipe_joined_and_sparse() {
		let targets = InviteTargets {
			touser: vec![
				UserId::new("zhangsan").expect("User fixture should be valid."),
				UserId::new("lisi").expect("User fixture should be valid."),
			],
			totag: vec![3],
			..Default::default()
		};
		let request = invite_user(&targets, Some(&callback())).expect("Invite body should serialize.");

		assert_eq!(request.path, "batch/inviteuser");
		assert_eq!(
			request.body,
			Some(json!({
				"touser": "zhangsan|lisi",
				"totag": "3",
				"callback": {
					"url": "https://corp.example.com/jobs",
					"token": "cb-token",
					"encodingaeskey": "aes-key"
				}
			}))
		);
	}

	#[test]
	fn media_jobs_omit_a_missing_callback() {
		let request = replace_party("media-42", None).expect("Job body should serialize.");

		assert_eq!(request.path, "batch/replaceparty");
		assert_eq!(request.body, Some(json!({ "media_id": "media-42" })));
	}
}
