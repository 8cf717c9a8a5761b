// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use wechat_enterprise_api::{
	_preludet::*,
	api::{AuthorizeScope, InviteTargets, MaterialPayload, WorkClient},
	auth::{CorpCredentials, CorpId, UserId},
	store::MemoryStore,
	transport::ReqwestTransportErrorMapper,
};

const CORP_ID: &str = "ww-endpoints";
const CORP_SECRET: &str = "secret-endpoints";
const AGENT_ID: i64 = 1000002;

fn json_reply(then: httpmock::Then, body: Value) -> httpmock::Then {
	then.status(200).header("content-type", "application/json").body(body.to_string())
}

fn user(value: &str) -> UserId {
	UserId::new(value).expect("User identifier fixture should be valid.")
}

async fn agent_client(server: &MockServer) -> ReqwestTestClient {
	let credentials = CorpCredentials::new(
		CorpId::new(CORP_ID).expect("Corp identifier fixture should be valid."),
		CORP_SECRET,
	)
	.with_agent_id(AGENT_ID);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/gettoken");
			json_reply(then, json!({ "errcode": 0, "access_token": "T1", "expires_in": 7200 }));
		})
		.await;

	WorkClient::with_http_client(
		Arc::new(MemoryStore::default()),
		test_descriptor(&server.url("/")),
		credentials,
		test_reqwest_http_client(),
		Arc::new(ReqwestTransportErrorMapper),
	)
}

#[tokio::test]
async fn tag_members_are_posted_as_json() {
	let server = MockServer::start_async().await;
	let client = agent_client(&server).await;
	let endpoint = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cgi-bin/tag/addtagusers")
				.query_param("access_token", "T1")
				.header("content-type", "application/json")
				.json_body(json!({ "tagid": 3, "userlist": ["zhangsan", "lisi"] }));
			json_reply(then, json!({ "errcode": 0, "errmsg": "ok", "invalidlist": "lisi" }));
		})
		.await;
	let value = client
		.add_tag_users(3, &[user("zhangsan"), user("lisi")])
		.await
		.expect("Adding tag members should succeed.");

	assert_eq!(value["invalidlist"], "lisi");

	endpoint.assert_calls_async(1).await;
}

#[tokio::test]
async fn batch_invites_join_their_targets() {
	let server = MockServer::start_async().await;
	let client = agent_client(&server).await;
	let endpoint = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cgi-bin/batch/inviteuser")
				.json_body(json!({ "touser": "zhangsan|lisi", "toparty": "1|2" }));
			json_reply(then, json!({ "errcode": 0, "errmsg": "ok", "jobid": "job-1" }));
		})
		.await;
	let targets = InviteTargets {
		touser: vec![user("zhangsan"), user("lisi")],
		toparty: vec![1, 2],
		..Default::default()
	};
	let job = client.batch_invite_user(&targets, None).await.expect("Invite job should start.");

	assert_eq!(job.jobid, "job-1");

	endpoint.assert_calls_async(1).await;
}

#[tokio::test]
async fn department_listing_encodes_flags() {
	let server = MockServer::start_async().await;
	let client = agent_client(&server).await;
	let endpoint = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/cgi-bin/user/simplelist")
				.query_param("department_id", "1")
				.query_param("fetch_child", "1")
				.query_param("status", "0");
			json_reply(then, json!({ "errcode": 0, "errmsg": "ok", "userlist": [] }));
		})
		.await;

	client.get_department_users(1, true, 0).await.expect("Department listing should succeed.");

	endpoint.assert_calls_async(1).await;
}

#[tokio::test]
async fn oauth_code_lookup_sends_the_agent() {
	let server = MockServer::start_async().await;
	let client = agent_client(&server).await;
	let endpoint = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/cgi-bin/user/getuserinfo")
				.query_param("code", "CODE")
				.query_param("agentid", AGENT_ID.to_string());
			json_reply(
				then,
				json!({ "errcode": 0, "errmsg": "ok", "UserId": "zhangsan", "DeviceId": "dev-1" }),
			);
		})
		.await;
	let identity = client.get_user_id_by_code("CODE").await.expect("Code lookup should succeed.");

	assert_eq!(identity.user_id, Some(user("zhangsan")));
	assert_eq!(identity.device_id.as_deref(), Some("dev-1"));
	assert_eq!(identity.open_id, None);

	endpoint.assert_calls_async(1).await;
}

#[tokio::test]
async fn material_downloads_keep_binary_bodies() {
	let server = MockServer::start_async().await;
	let client = agent_client(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/cgi-bin/material/get")
				.query_param("agentid", AGENT_ID.to_string())
				.query_param("media_id", "img-1");
			then.status(200).header("content-type", "image/jpeg").body([0xff_u8, 0xd8, 0xff]);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/material/get").query_param("media_id", "news-1");
			json_reply(then, json!({ "errcode": 0, "errmsg": "ok", "mpnews": { "articles": [] } }));
		})
		.await;

	let image = client.get_material(AGENT_ID, "img-1").await.expect("Image download should work.");
	let news = client.get_material(AGENT_ID, "news-1").await.expect("News download should work.");

	assert_eq!(
		image,
		MaterialPayload::Binary {
			content_type: Some("image/jpeg".into()),
			bytes: vec![0xff, 0xd8, 0xff],
		}
	);
	assert!(matches!(news, MaterialPayload::Json(value) if value["mpnews"]["articles"] == json!([])));
}

#[tokio::test]
async fn authorize_urls_are_built_locally() {
	let server = MockServer::start_async().await;
	let client = agent_client(&server).await;
	let redirect = Url::parse("https://corp.example.com/callback?from=menu")
		.expect("Redirect fixture should parse.");
	let url = client.authorize_url(&redirect, Some("xyz"), AuthorizeScope::UserInfo);
	let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

	assert_eq!(url.path(), "/connect/oauth2/authorize");
	assert_eq!(url.fragment(), Some("wechat_redirect"));
	assert_eq!(
		pairs,
		[
			("appid".to_owned(), CORP_ID.to_owned()),
			("redirect_uri".to_owned(), redirect.to_string()),
			("response_type".to_owned(), "code".to_owned()),
			("scope".to_owned(), "snsapi_userinfo".to_owned()),
			("state".to_owned(), "xyz".to_owned()),
		]
	);
	assert_eq!(client.tokens().metrics().attempts(), 0);

	let default_state = client.authorize_url(&redirect, None, AuthorizeScope::default());

	assert!(default_state.as_str().contains("scope=snsapi_base&state=#wechat_redirect"));
}
