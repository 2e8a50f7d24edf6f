//! Authorization-code exchanges and the quota introspection call.
//!
//! The code-exchange endpoints authenticate with the application credentials directly, so
//! they bypass the token manager and the `40001` retry machinery entirely; a one-time code
//! cannot become valid by retrying. [`Client::api_quota`] is layered on [`Client::post`] and
//! doubles as the composition pattern other endpoint wrappers should follow.

// self
use crate::{
	_prelude::*,
	client::{Client, request},
	error::{ApiError, ErrorResponse},
	http::{JsonParams, Method, Transport},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

const CODE_TOKEN_PATH: &str = "/sns/oauth2/access_token";
const QUOTA_PATH: &str = "/cgi-bin/openapi/quota/get";
const SESSION_PATH: &str = "/sns/jscode2session";

/// Session established from a one-time authorization code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	/// User identifier unique to the application.
	pub openid: String,
	/// Session key used to verify and decrypt user payloads; callers must avoid logging it.
	pub session_key: String,
	/// Cross-application user identifier, when the platform grants one.
	pub unionid: Option<String>,
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("openid", &self.openid)
			.field("session_key", &"<redacted>")
			.field("unionid", &self.unionid)
			.finish()
	}
}

/// Per-user token minted from a one-time authorization code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeToken {
	/// Bearer access token scoped to the authorizing user.
	pub access_token: String,
	/// Opaque refresh token; this crate never performs the renewal itself.
	pub refresh_token: Option<String>,
	/// Validity horizon in seconds as reported by the platform.
	pub expires_in: i64,
	/// User identifier unique to the application.
	pub openid: String,
	/// Scopes granted to the token, when reported.
	pub scope: Option<String>,
	/// Cross-application user identifier, when the platform grants one.
	pub unionid: Option<String>,
}
impl Debug for CodeToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CodeToken")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("openid", &self.openid)
			.field("scope", &self.scope)
			.field("unionid", &self.unionid)
			.finish()
	}
}

/// Daily quota snapshot for one API path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiQuota {
	/// Total calls permitted per day.
	pub daily_limit: i64,
	/// Calls consumed today.
	pub used: i64,
	/// Calls remaining today.
	pub remain: i64,
}

#[derive(Deserialize)]
struct QuotaEnvelope {
	quota: ApiQuota,
}

impl<C> Client<C>
where
	C: ?Sized + Transport,
{
	/// Exchanges a one-time authorization code for a user session.
	pub async fn session_from_code(&self, code: &str) -> Result<Session> {
		self.exchange_code(
			SESSION_PATH,
			"js_code",
			code,
			"Unable to create a session from the code.",
		)
		.await
	}

	/// Exchanges a one-time authorization code for a per-user token.
	///
	/// The returned `refresh_token` is opaque pass-through data.
	pub async fn token_from_code(&self, code: &str) -> Result<CodeToken> {
		self.exchange_code(
			CODE_TOKEN_PATH,
			"code",
			code,
			"Unable to create a token from the code.",
		)
		.await
	}

	/// Queries today's call quota for the provided API path.
	pub async fn api_quota(&self, path: &str) -> Result<ApiQuota> {
		let mut params = JsonParams::new();

		params.insert("cgi_path".into(), path.into());

		let envelope: QuotaEnvelope = self.post(QUOTA_PATH, &params).await?;

		Ok(envelope.quota)
	}

	async fn exchange_code<T>(
		&self,
		path: &'static str,
		code_param: &'static str,
		code: &str,
		context: &'static str,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::CodeExchange;

		let span = CallSpan::new(KIND, "exchange_code");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut params = JsonParams::new();

				params.insert("appid".into(), self.app_id().as_ref().into());
				params.insert("secret".into(), self.app_secret().expose().into());
				params.insert(code_param.into(), code.into());
				params.insert("grant_type".into(), "authorization_code".into());

				let raw = self
					.transport
					.request(Method::Get, path, None, &params)
					.await
					.map_err(Error::from)?;
				let value: JsonValue = raw.json()?;
				let response = ErrorResponse::from_value(&value);

				if response.is_failure() {
					return Err(ApiError::classify(context, response).into());
				}

				request::decode(value)
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}
}
