// crates.io
use httpmock::prelude::*;
// self
use miniapp_openapi::{
	_preludet::*,
	error::TransportError,
	http::{JsonParams, Method, Transport},
};

fn endpoint(server: &MockServer) -> Url {
	Url::parse(&server.base_url()).expect("Mock server URL should parse successfully.")
}

fn params(value: JsonValue) -> JsonParams {
	value.as_object().cloned().expect("Parameter fixture should be a JSON object.")
}

#[tokio::test]
async fn get_serializes_params_and_token_into_the_query() {
	let server = MockServer::start_async().await;
	let transport = test_transport(endpoint(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/cgi-bin/user/info")
				.query_param("openid", "o-1")
				.query_param("lang", "en")
				.query_param("access_token", "token-1");
			then.status(200).header("content-type", "application/json").body("{\"errcode\":0}");
		})
		.await;
	let query = params(serde_json::json!({ "openid": "o-1", "lang": "en" }));
	let raw = transport
		.request(Method::Get, "/cgi-bin/user/info", Some("token-1"), &query)
		.await
		.expect("GET request should succeed against the mock server.");

	assert_eq!(raw.status, 200);
	assert!(raw.is_json());

	mock.assert_async().await;
}

#[tokio::test]
async fn post_sends_params_as_json_body_and_token_in_query() {
	let server = MockServer::start_async().await;
	let transport = test_transport(endpoint(&server));
	let mock = server
		.mock_async(|when, then| {
			// serde_json object keys serialize in sorted order, so the body is deterministic.
			when.method(POST)
				.path("/cgi-bin/message/send")
				.query_param("access_token", "token-2")
				.header("content-type", "application/json")
				.body("{\"template_id\":\"tpl-1\",\"touser\":\"o-1\"}");
			then.status(200).header("content-type", "application/json").body("{\"errcode\":0}");
		})
		.await;
	let body = params(serde_json::json!({ "touser": "o-1", "template_id": "tpl-1" }));
	let raw = transport
		.request(Method::Post, "/cgi-bin/message/send", Some("token-2"), &body)
		.await
		.expect("POST request should succeed against the mock server.");

	assert_eq!(raw.status, 200);

	mock.assert_async().await;
}

#[tokio::test]
async fn invalid_paths_are_rejected_before_the_network() {
	let server = MockServer::start_async().await;
	let transport = test_transport(endpoint(&server));
	let sentinel = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200).header("content-type", "application/json").body("{\"errcode\":0}");
		})
		.await;
	let err = transport
		.request(Method::Get, "cgi-bin/token", None, &JsonParams::new())
		.await
		.expect_err("Paths without a leading slash must be rejected.");

	assert!(matches!(err, TransportError::InvalidPath { ref path } if path == "cgi-bin/token"));

	sentinel.assert_calls_async(0).await;
}

#[tokio::test]
async fn responses_capture_status_content_type_and_body() {
	let server = MockServer::start_async().await;
	let transport = test_transport(endpoint(&server));
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/media/get");
			then.status(404).header("content-type", "text/plain").body("not here");
		})
		.await;
	let raw = transport
		.request(Method::Get, "/cgi-bin/media/get", None, &JsonParams::new())
		.await
		.expect("Transport should hand back non-2xx responses untouched.");

	assert_eq!(raw.status, 404);
	assert_eq!(raw.content_type.as_deref(), Some("text/plain"));
	assert_eq!(raw.body, b"not here");
	assert!(!raw.is_json());
}
