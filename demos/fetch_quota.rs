//! Demonstrates minting an access token against a mock platform endpoint and querying the
//! remaining daily quota for an API path.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use miniapp_openapi::{
	auth::{AppId, AppSecret},
	client::Client,
	http::ReqwestTransport,
	reqwest,
	store::{MemoryStore, TokenStore},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":7200}");
		})
		.await;
	let quota_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/openapi/quota/get");
			then.status(200).header("content-type", "application/json").body(
				"{\"errcode\":0,\"quota\":{\"daily_limit\":1000,\"used\":42,\"remain\":958}}",
			);
		})
		.await;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let transport = ReqwestTransport::with_client(
		reqwest::Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
		Url::parse(&server.base_url())?,
	);
	let client = Client::with_transport(
		store,
		AppId::new("wx-demo-app")?,
		AppSecret::new("demo-secret"),
		transport,
	);
	let quota = client.api_quota("/cgi-bin/message/send").await?;

	println!("Daily limit {}, used {}, remaining {}.", quota.daily_limit, quota.used, quota.remain);

	token_mock.assert_async().await;
	quota_mock.assert_async().await;

	Ok(())
}
