//! Demonstrates downloading binary media through the raw request surface, which returns
//! non-JSON bodies untouched while still classifying JSON error payloads.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use miniapp_openapi::{
	auth::{AppId, AppSecret},
	client::Client,
	http::{JsonParams, ReqwestTransport},
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
	let media_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/media/get");
			then.status(200).header("content-type", "image/jpeg").body("demo-jpeg-bytes");
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
	let mut params = JsonParams::new();

	params.insert("media_id".into(), "demo-media".into());

	let raw = client.get_raw("/cgi-bin/media/get", &params).await?;

	println!(
		"Downloaded {} bytes with content type {}.",
		raw.body.len(),
		raw.content_type.as_deref().unwrap_or("unknown"),
	);

	token_mock.assert_async().await;
	media_mock.assert_async().await;

	Ok(())
}
