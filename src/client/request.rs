//! The request/retry state machine shared by JSON and raw calls.
//!
//! Every request runs a two-state machine: the first attempt uses whatever token is cached;
//! a `40001` (invalid/stale credential) body forces a token refresh and exactly one replay of
//! the whole request. Any other error code surfaces immediately so quota or input failures
//! are never masked as transient. A raw call whose body is not JSON can never carry an
//! `errcode` by protocol convention and is returned untouched.

// self
use crate::{
	_prelude::*,
	auth::TokenKind,
	client::Client,
	error::{ApiError, ERR_INVALID_CREDENTIAL, ErrorResponse},
	http::{JsonParams, Method, RawResponse, Transport},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

impl<C> Client<C>
where
	C: ?Sized + Transport,
{
	/// Issues a GET request and decodes the JSON payload into `T`.
	pub async fn get<T>(&self, path: &str, params: &JsonParams) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.dispatch(CallKind::Request, Method::Get, path, params, true).await?.json()
	}

	/// Issues a POST request and decodes the JSON payload into `T`.
	pub async fn post<T>(&self, path: &str, params: &JsonParams) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.dispatch(CallKind::Request, Method::Post, path, params, true).await?.json()
	}

	/// Issues a GET request and returns the raw response.
	///
	/// Bodies with a JSON content type are still inspected for an `errcode`; anything else
	/// (e.g. binary media) is returned as-is without interpretation.
	pub async fn get_raw(&self, path: &str, params: &JsonParams) -> Result<RawResponse> {
		self.dispatch(CallKind::RawRequest, Method::Get, path, params, false).await
	}

	/// Issues a POST request and returns the raw response.
	///
	/// Bodies with a JSON content type are still inspected for an `errcode`; anything else
	/// (e.g. binary media) is returned as-is without interpretation.
	pub async fn post_raw(&self, path: &str, params: &JsonParams) -> Result<RawResponse> {
		self.dispatch(CallKind::RawRequest, Method::Post, path, params, false).await
	}

	async fn dispatch(
		&self,
		call: CallKind,
		method: Method,
		path: &str,
		params: &JsonParams,
		decode_json: bool,
	) -> Result<RawResponse> {
		let span = CallSpan::new(call, "dispatch");

		obs::record_call_outcome(call, CallOutcome::Attempt);

		let result =
			span.instrument(self.dispatch_inner(method, path, params, decode_json)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(call, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(call, CallOutcome::Failure),
		}

		result
	}

	async fn dispatch_inner(
		&self,
		method: Method,
		path: &str,
		params: &JsonParams,
		decode_json: bool,
	) -> Result<RawResponse> {
		let mut retried = false;

		loop {
			// The retry pass deletes the cached token and mints a fresh one.
			let token = self.token(TokenKind::Standard, retried).await?;
			let raw = self
				.transport
				.request(method, path, Some(&token), params)
				.await
				.map_err(Error::from)?;

			if !decode_json && !raw.is_json() {
				return Ok(raw);
			}

			let value: JsonValue = raw.json()?;
			let response = ErrorResponse::from_value(&value);

			if !response.is_failure() {
				return Ok(raw);
			}
			if response.errcode == ERR_INVALID_CREDENTIAL && !retried {
				retried = true;

				continue;
			}

			return Err(
				ApiError::classify(format!("Request to '{path}' is failed."), response).into()
			);
		}
	}
}

/// Decodes an already-parsed JSON value into `T`, reporting the failing path on error.
pub(crate) fn decode<T>(value: JsonValue) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value)
		.map_err(|source| Error::ResponseParse { source, status: None })
}
