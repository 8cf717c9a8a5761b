//! Shows the request gate recovering from a revoked access token.
//!
//! The store is seeded with a token the mock server no longer accepts. The first `agent/list`
//! call is rejected with `42001`, the client mints a replacement through `gettoken`, and the
//! call is repeated once with the new token.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use wechat_enterprise_api::{
	api::WorkClient,
	auth::{CorpCredentials, CorpId, Credential},
	descriptor::ApiDescriptor,
	http::ReqwestHttpClient,
	reqwest::Client,
	store::{CredentialStore, MemoryStore},
	transport::ReqwestTransportErrorMapper,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let gettoken = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/gettoken");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"errcode":0,"errmsg":"ok","access_token":"demo-fresh","expires_in":7200}"#);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/agent/list").query_param("access_token", "demo-revoked");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"errcode":42001,"errmsg":"access_token expired"}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/agent/list").query_param("access_token", "demo-fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"errcode":0,"errmsg":"ok","agentlist":[{"agentid":1000002,"name":"Helpdesk"}]}"#);
		})
		.await;

	let descriptor = ApiDescriptor::builder()
		.api_base(Url::parse(&server.url("/cgi-bin/"))?)
		.authorize_endpoint(Url::parse(&server.url("/connect/oauth2/authorize"))?)
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let store = Arc::new(MemoryStore::default());
	let credentials = CorpCredentials::new(CorpId::new("ww-demo-corp")?, "demo-secret");
	let client = <WorkClient<ReqwestHttpClient, ReqwestTransportErrorMapper>>::with_http_client(
		store.clone(),
		descriptor,
		credentials,
		http_client,
		ReqwestTransportErrorMapper,
	);
	let revoked = Credential::builder(client.tokens().scope().clone())
		.token("demo-revoked")
		.expires_in(Duration::hours(1))
		.build()?;

	store.save(revoked).await?;

	let agents = client.list_agents().await?;

	println!("Agents: {}.", agents["agentlist"]);
	println!(
		"Dispatches: {}, retries: {}, forced refreshes: {}.",
		client.mediator().metrics().calls(),
		client.mediator().metrics().retries(),
		client.tokens().metrics().forced(),
	);

	gettoken.assert_async().await;

	Ok(())
}
