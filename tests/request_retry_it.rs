// crates.io
use httpmock::prelude::*;
// self
use miniapp_openapi::{
	_preludet::*,
	auth::{AppId, AppSecret, StoredToken, TokenKind},
	http::JsonParams,
	store::{CacheKey, MemoryStore, TokenStore},
};

const APP_ID: &str = "wx-retry";
const APP_SECRET: &str = "retry-secret";
const DATA_PATH: &str = "/cgi-bin/user/info";

fn endpoint(server: &MockServer) -> Url {
	Url::parse(&server.base_url()).expect("Mock server URL should parse successfully.")
}

fn params() -> JsonParams {
	let mut params = JsonParams::new();

	params.insert("openid".into(), "o-1".into());

	params
}

async fn seed_stale_token(store: &MemoryStore) {
	let app_id = AppId::new(APP_ID).expect("Application identifier should be valid for tests.");
	let key = CacheKey::new(&app_id, &AppSecret::new(APP_SECRET), TokenKind::Standard);

	store
		.set(&key, StoredToken::new("stale-token"), Duration::hours(1))
		.await
		.expect("Seeding the token store should succeed.");
}

/// Mocks the data path so a stale token fails with `40001` and a fresh one succeeds, plus the
/// token endpoint minting `fresh-token`.
async fn mock_stale_then_fresh<'a>(
	server: &'a MockServer,
) -> (httpmock::Mock<'a>, httpmock::Mock<'a>, httpmock::Mock<'a>) {
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH).query_param("access_token", "stale-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40001,\"errmsg\":\"invalid credential\"}");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH).query_param("access_token", "fresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"openid\":\"o-1\",\"nickname\":\"demo\"}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-token\",\"expires_in\":7200}");
		})
		.await;

	(stale, fresh, token)
}

#[derive(Debug, Deserialize)]
struct UserInfo {
	openid: String,
	nickname: String,
}

#[tokio::test]
async fn get_replays_once_after_an_invalid_credential() {
	let server = MockServer::start_async().await;
	let (client, store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);

	seed_stale_token(&store).await;

	let (stale, fresh, token) = mock_stale_then_fresh(&server).await;
	let info: UserInfo = client
		.get(DATA_PATH, &params())
		.await
		.expect("The retried request should succeed with the fresh token.");

	assert_eq!(info.openid, "o-1");
	assert_eq!(info.nickname, "demo");

	stale.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;
	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn post_replays_once_after_an_invalid_credential() {
	let server = MockServer::start_async().await;
	let (client, store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);

	seed_stale_token(&store).await;

	let stale = server
		.mock_async(|when, then| {
			when.method(POST).path(DATA_PATH).query_param("access_token", "stale-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40001,\"errmsg\":\"invalid credential\"}");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(POST).path(DATA_PATH).query_param("access_token", "fresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"openid\":\"o-1\",\"nickname\":\"demo\"}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-token\",\"expires_in\":7200}");
		})
		.await;
	let info: UserInfo = client
		.post(DATA_PATH, &params())
		.await
		.expect("The retried request should succeed with the fresh token.");

	assert_eq!(info.nickname, "demo");

	stale.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;
	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn post_raw_replays_once_after_an_invalid_credential() {
	let server = MockServer::start_async().await;
	let (client, store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);

	seed_stale_token(&store).await;

	let stale = server
		.mock_async(|when, then| {
			when.method(POST).path(DATA_PATH).query_param("access_token", "stale-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40001,\"errmsg\":\"invalid credential\"}");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(POST).path(DATA_PATH).query_param("access_token", "fresh-token");
			then.status(200).header("content-type", "image/jpeg").body("jpeg-bytes");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-token\",\"expires_in\":7200}");
		})
		.await;
	let raw = client
		.post_raw(DATA_PATH, &params())
		.await
		.expect("The retried raw request should succeed with the fresh token.");

	// The replay lands on a binary body, which passes through untouched.
	assert_eq!(raw.status, 200);
	assert!(!raw.is_json());
	assert_eq!(raw.body, b"jpeg-bytes");

	stale.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;
	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn raw_requests_participate_in_the_retry_machine() {
	let server = MockServer::start_async().await;
	let (client, store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);

	seed_stale_token(&store).await;

	let (stale, fresh, token) = mock_stale_then_fresh(&server).await;
	let raw = client
		.get_raw(DATA_PATH, &params())
		.await
		.expect("The retried raw request should succeed with the fresh token.");

	assert_eq!(raw.status, 200);
	assert!(raw.is_json());

	stale.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;
	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn non_retryable_codes_surface_without_a_replay() {
	let server = MockServer::start_async().await;
	let (client, store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);

	seed_stale_token(&store).await;

	let data = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":45009,\"errmsg\":\"reach max api daily quota limit\"}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-token\",\"expires_in\":7200}");
		})
		.await;
	let err = client
		.get::<UserInfo>(DATA_PATH, &params())
		.await
		.expect_err("Quota failures must surface immediately.");
	let Error::Api(api) = err else {
		panic!("Quota failures should map to a typed API error, got {err:?}.");
	};

	assert_eq!(api.message, format!("Request to '{DATA_PATH}' is failed."));
	assert_eq!(api.response.errcode, 45009);

	data.assert_calls_async(1).await;
	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn a_second_invalid_credential_is_terminal() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);
	let data = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40001,\"errmsg\":\"invalid credential\"}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"still-bad-token\",\"expires_in\":7200}");
		})
		.await;
	let err = client
		.get::<UserInfo>(DATA_PATH, &params())
		.await
		.expect_err("A second invalid-credential failure must be terminal.");
	let Error::Api(api) = err else {
		panic!("Terminal invalid-credential failures should map to a typed API error, got {err:?}.");
	};

	assert_eq!(api.response.errcode, 40001);

	// Cold cache: one mint per attempt, one data call per attempt, then terminal failure.
	data.assert_calls_async(2).await;
	token.assert_calls_async(2).await;
}

#[tokio::test]
async fn raw_non_json_bodies_pass_through_untouched() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);
	let media = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/media/get");
			then.status(200).header("content-type", "image/jpeg").body("jpeg-bytes");
		})
		.await;
	let _token = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"media-token\",\"expires_in\":7200}");
		})
		.await;
	let raw = client
		.get_raw("/cgi-bin/media/get", &JsonParams::new())
		.await
		.expect("Raw media downloads should succeed.");

	assert_eq!(raw.status, 200);
	assert!(!raw.is_json());
	assert_eq!(raw.content_type.as_deref(), Some("image/jpeg"));
	assert_eq!(raw.body, b"jpeg-bytes");

	media.assert_calls_async(1).await;
}

#[tokio::test]
async fn raw_json_error_bodies_are_still_classified() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);
	let _media = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/media/get");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40007,\"errmsg\":\"invalid media_id\"}");
		})
		.await;
	let _token = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"media-token\",\"expires_in\":7200}");
		})
		.await;
	let err = client
		.get_raw("/cgi-bin/media/get", &JsonParams::new())
		.await
		.expect_err("JSON error bodies must be classified even on raw calls.");
	let Error::Api(api) = err else {
		panic!("Raw-call error bodies should map to a typed API error, got {err:?}.");
	};

	assert_eq!(api.response.errcode, 40007);
}

#[tokio::test]
async fn invalid_paths_fail_before_any_network_call() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_test_client(endpoint(&server), APP_ID, APP_SECRET);
	let token = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"unused-token\",\"expires_in\":7200}");
		})
		.await;
	let err = client
		.get::<UserInfo>("cgi-bin/user/info", &params())
		.await
		.expect_err("Paths without a leading slash must be rejected.");

	assert!(matches!(
		err,
		Error::Transport(miniapp_openapi::error::TransportError::InvalidPath { ref path })
			if path == "cgi-bin/user/info",
	));

	// The token mint succeeds; only the data call itself is rejected client-side.
	token.assert_calls_async(1).await;
}
