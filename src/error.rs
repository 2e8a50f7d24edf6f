//! Client-wide error types and the remote error-code classifier.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error code the platform returns for an invalid or stale access token.
///
/// This is the only failure the request client recovers from on its own: one forced token
/// refresh followed by a single replay of the request. Every other code surfaces immediately
/// so quota or input failures are never masked as transient.
pub const ERR_INVALID_CREDENTIAL: i64 = 40001;

/// Fixed table of authorization-code failures mapped to human phrases.
const AUTHORIZATION_CODE_FAILURES: &[(i64, &str)] =
	&[(40029, "invalid code"), (40163, "code already used"), (42003, "code expired")];

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Transport failure (validation, DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Remote API rejected the call with a nonzero `errcode`.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Response body could not be parsed as JSON.
	#[error("Platform API returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (request validation, network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Request path did not start with a slash; rejected before any network call.
	#[error("Request path `{path}` must start with `/`.")]
	InvalidPath {
		/// Offending path string.
		path: String,
	},
	/// Request URL could not be composed from the endpoint and path.
	#[error("Request URL could not be constructed.")]
	Url(#[from] url::ParseError),
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the platform API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the platform API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Raw error payload carried by every failed platform response.
///
/// A nonzero `errcode` marks a failure regardless of the HTTP status code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Numeric status field; zero or absent means success.
	#[serde(default)]
	pub errcode: i64,
	/// Human-readable message accompanying the code.
	#[serde(default)]
	pub errmsg: String,
}
impl ErrorResponse {
	/// Extracts the `{errcode, errmsg}` pair from an arbitrary JSON body.
	pub fn from_value(value: &JsonValue) -> Self {
		Self {
			errcode: value.get("errcode").and_then(JsonValue::as_i64).unwrap_or_default(),
			errmsg: value
				.get("errmsg")
				.and_then(JsonValue::as_str)
				.unwrap_or_default()
				.to_owned(),
		}
	}

	/// Returns `true` when the payload marks a failure.
	pub fn is_failure(&self) -> bool {
		self.errcode != 0
	}
}

/// Distinguishes generic protocol failures from authorization-code failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
	/// Generic remote protocol failure.
	Api,
	/// Failure from the fixed authorization-code table (invalid, used, or expired code).
	AuthorizationCode,
}

/// Typed remote failure produced by [`ApiError::classify`].
///
/// Serializes deterministically to `{name, message, response}` so the error is safe to log
/// or hand to machine consumers directly.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ApiError {
	/// Error subtype tag.
	pub kind: ApiErrorKind,
	/// Human-readable message combining the call context with the failure phrase.
	pub message: String,
	/// Original structured payload returned by the platform.
	pub response: ErrorResponse,
}
impl ApiError {
	/// Maps a raw error payload onto a typed error.
	///
	/// When `errcode` matches the authorization-code table, the phrase is appended to the
	/// context (a trailing `.` is stripped and re-appended after the phrase); otherwise the
	/// context is used verbatim and the generic subtype is produced.
	pub fn classify(context: impl Into<String>, response: ErrorResponse) -> Self {
		let context = context.into();

		match authorization_code_phrase(response.errcode) {
			Some(phrase) => Self {
				kind: ApiErrorKind::AuthorizationCode,
				message: compose_message(&context, phrase),
				response,
			},
			None => Self { kind: ApiErrorKind::Api, message: context, response },
		}
	}

	/// Stable type tag used as the `name` field in serialized form.
	pub const fn name(&self) -> &'static str {
		match self.kind {
			ApiErrorKind::Api => "ApiError",
			ApiErrorKind::AuthorizationCode => "AuthorizationCodeError",
		}
	}

	/// Returns `true` for the authorization-code subtype.
	pub const fn is_authorization_code(&self) -> bool {
		matches!(self.kind, ApiErrorKind::AuthorizationCode)
	}
}
impl Serialize for ApiError {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		use serde::ser::SerializeStruct;

		let mut state = serializer.serialize_struct("ApiError", 3)?;

		state.serialize_field("name", self.name())?;
		state.serialize_field("message", &self.message)?;
		state.serialize_field("response", &self.response)?;
		state.end()
	}
}

fn authorization_code_phrase(errcode: i64) -> Option<&'static str> {
	AUTHORIZATION_CODE_FAILURES
		.iter()
		.find(|(code, _)| *code == errcode)
		.map(|(_, phrase)| *phrase)
}

fn compose_message(context: &str, phrase: &str) -> String {
	match context.strip_suffix('.') {
		Some(stripped) => format!("{stripped}: {phrase}."),
		None => format!("{context}: {phrase}"),
	}
}
