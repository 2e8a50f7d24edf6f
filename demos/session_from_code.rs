//! Demonstrates exchanging a one-time authorization code for a user session against a mock
//! platform endpoint.

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
	let session_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/sns/jscode2session");
			then.status(200).header("content-type", "application/json").body(
				"{\"openid\":\"demo-openid\",\"session_key\":\"demo-session-key\",\
				 \"unionid\":\"demo-unionid\"}",
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
	let session = client.session_from_code("demo-js-code").await?;

	// The debug form redacts the session key; only the identifiers are printable.
	println!("Established session: {session:?}.");
	println!("User openid: {}.", session.openid);

	session_mock.assert_async().await;

	Ok(())
}
