//! Access-token lifecycle: cache lookups, forced refreshes, and remote minting.
//!
//! Two near-identical lifecycles exist, discriminated by [`TokenKind`]. The stable variant is
//! minted through a dedicated endpoint whose generation rate the platform itself limits (one
//! fresh grant per 30 seconds, 20 per day at most); the limits surface as remote errors and
//! are not enforced locally. Minted tokens are cached with a 10-second safety margin below
//! the reported `expires_in`, guarding against clock skew and in-flight latency.

// self
use crate::{
	_prelude::*,
	auth::{StoredToken, TokenKind},
	client::Client,
	error::{ApiError, ErrorResponse},
	http::{JsonParams, Method, Transport},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::CacheKey,
};

const DEFAULT_EXPIRES_IN: i64 = 7_200;
const EXPIRY_SAFETY_MARGIN: i64 = 10;

#[derive(Debug, Deserialize)]
struct TokenGrant {
	access_token: Option<String>,
	expires_in: Option<i64>,
	#[serde(default)]
	errcode: i64,
	#[serde(default)]
	errmsg: String,
}

impl TokenKind {
	const fn creation_method(self) -> Method {
		match self {
			TokenKind::Standard => Method::Get,
			TokenKind::Stable => Method::Post,
		}
	}

	const fn creation_path(self) -> &'static str {
		match self {
			TokenKind::Standard => "/cgi-bin/token",
			TokenKind::Stable => "/cgi-bin/stable_token",
		}
	}

	const fn failure_context(self) -> &'static str {
		match self {
			TokenKind::Standard => "Unable to get an access token.",
			TokenKind::Stable => "Unable to get a stable access token.",
		}
	}

	const fn call_kind(self) -> CallKind {
		match self {
			TokenKind::Standard => CallKind::AccessToken,
			TokenKind::Stable => CallKind::StableAccessToken,
		}
	}
}

impl<C> Client<C>
where
	C: ?Sized + Transport,
{
	/// Returns a valid standard access token, minting one on cache miss.
	///
	/// With `force_refresh` the cached entry is deleted first and a fresh token is requested
	/// unconditionally; deleting a missing entry is a no-op.
	pub async fn access_token(&self, force_refresh: bool) -> Result<String> {
		self.token(TokenKind::Standard, force_refresh).await
	}

	/// Returns a valid stable access token, minting one on cache miss.
	///
	/// Fresh stable grants are throttled by the platform itself (30-second minimum interval,
	/// 20 per day); exceeding the limits surfaces as a remote error.
	pub async fn stable_access_token(&self, force_refresh: bool) -> Result<String> {
		self.token(TokenKind::Stable, force_refresh).await
	}

	pub(crate) async fn token(&self, kind: TokenKind, force_refresh: bool) -> Result<String> {
		let call = kind.call_kind();
		let span = CallSpan::new(call, "token");

		obs::record_call_outcome(call, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let key = CacheKey::new(self.app_id(), self.app_secret(), kind);
				let guard = self.token_guard(&key);
				let _singleflight = guard.lock().await;

				if force_refresh {
					self.store.delete(&key).await?;
				} else if let Some(cached) = self.store.get(&key).await? {
					return Ok(cached.access_token);
				}

				let grant: TokenGrant = self
					.transport
					.request(
						kind.creation_method(),
						kind.creation_path(),
						None,
						&self.grant_params(kind, force_refresh),
					)
					.await
					.map_err(Error::from)?
					.json()?;
				let Some(access_token) = grant.access_token else {
					return Err(ApiError::classify(
						kind.failure_context(),
						ErrorResponse { errcode: grant.errcode, errmsg: grant.errmsg },
					)
					.into());
				};
				let ttl = grant.expires_in.unwrap_or(DEFAULT_EXPIRES_IN) - EXPIRY_SAFETY_MARGIN;

				self.store
					.set(
						&key,
						StoredToken::new(access_token.clone()),
						Duration::seconds(ttl.max(0)),
					)
					.await?;

				Ok(access_token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(call, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(call, CallOutcome::Failure),
		}

		result
	}

	fn grant_params(&self, kind: TokenKind, force_refresh: bool) -> JsonParams {
		let mut params = JsonParams::new();

		params.insert("grant_type".into(), "client_credential".into());
		params.insert("appid".into(), self.app_id().as_ref().into());
		params.insert("secret".into(), self.app_secret().expose().into());

		if matches!(kind, TokenKind::Stable) {
			params.insert("force_refresh".into(), force_refresh.into());
		}

		params
	}
}
