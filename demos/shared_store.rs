//! Two clients, one token: a [`FileStore`] lets independent clients (or processes) adopt the
//! access token whichever of them minted first.

// std
use std::{env, fs, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use wechat_enterprise_api::{
	api::WorkClient,
	auth::{CorpCredentials, CorpId},
	descriptor::ApiDescriptor,
	http::ReqwestHttpClient,
	reqwest::Client,
	store::FileStore,
	transport::ReqwestTransportErrorMapper,
};

type DemoClient = WorkClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

fn client(descriptor: &ApiDescriptor, store: FileStore) -> Result<DemoClient> {
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let credentials = CorpCredentials::new(CorpId::new("ww-demo-corp")?, "demo-secret");

	Ok(DemoClient::with_http_client(
		Arc::new(store),
		descriptor.clone(),
		credentials,
		http_client,
		ReqwestTransportErrorMapper,
	))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let gettoken = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/gettoken");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"errcode":0,"errmsg":"ok","access_token":"demo-shared","expires_in":7200}"#);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/getcallbackip");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"errcode":0,"errmsg":"ok","ip_list":["101.226.103.0/25"]}"#);
		})
		.await;

	let descriptor = ApiDescriptor::builder()
		.api_base(Url::parse(&server.url("/cgi-bin/"))?)
		.authorize_endpoint(Url::parse(&server.url("/connect/oauth2/authorize"))?)
		.build()?;
	let path = env::temp_dir().join(format!("wechat_enterprise_demo_{}.json", std::process::id()));
	let first = client(&descriptor, FileStore::open(&path)?)?;
	let second = client(&descriptor, FileStore::open(&path)?)?;
	let ips = first.get_callback_ip().await?;

	second.get_callback_ip().await?;

	println!("Callback IPs: {:?}.", ips.ip_list);
	println!(
		"First client minted {} token(s); second adopted {} from {}.",
		first.tokens().metrics().successes(),
		second.tokens().metrics().adopted(),
		path.display(),
	);

	gettoken.assert_async().await;
	fs::remove_file(&path)?;

	Ok(())
}
