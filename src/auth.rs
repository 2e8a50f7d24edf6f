//! Strongly typed application credentials and cached token records.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const APP_ID_MAX_LEN: usize = 64;
const SECRET_FRAGMENT_LEN: usize = 12;

/// Error returned when credential validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum CredentialError {
	/// The application identifier was empty.
	#[error("Application identifier cannot be empty.")]
	Empty,
	/// The application identifier contains whitespace characters.
	#[error("Application identifier contains whitespace.")]
	ContainsWhitespace,
	/// The application identifier exceeded the allowed character count.
	#[error("Application identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Validated application identifier issued by the platform.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppId(String);
impl AppId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, CredentialError> {
		let view = value.as_ref();

		validate_app_id(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for AppId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for AppId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for AppId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<AppId> for String {
	fn from(value: AppId) -> Self {
		value.0
	}
}
impl TryFrom<String> for AppId {
	type Error = CredentialError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_app_id(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for AppId {
	type Err = CredentialError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for AppId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "AppId({})", self.0)
	}
}
impl Display for AppId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Redacted application secret keeping credential material out of logs and cache keys.
#[derive(Clone, PartialEq, Eq)]
pub struct AppSecret(String);
impl AppSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Truncated base64 (no padding) SHA-256 digest of the secret, used as a cache-key
	/// component. Rotating the secret changes the fragment, so tokens minted under the old
	/// secret can never be served from cache again.
	pub fn cache_fragment(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());
		let mut encoded = URL_SAFE_NO_PAD.encode(digest);

		encoded.truncate(SECRET_FRAGMENT_LEN);

		encoded
	}
}
impl Debug for AppSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AppSecret").field(&"<redacted>").finish()
	}
}
impl Display for AppSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Token variants issued by the platform's credential endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
	/// Standard short-lived access token.
	Standard,
	/// Stable access token with remote-enforced generation limits.
	Stable,
}
impl TokenKind {
	/// Returns a stable label suitable for cache keys or span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Standard => "standard",
			TokenKind::Stable => "stable",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Immutable token value cached by [`TokenStore`](crate::store::TokenStore) backends.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
	/// Bearer access token; callers must avoid logging it.
	pub access_token: String,
	/// Opaque refresh token when the issuing endpoint returned one; never renewed locally.
	pub refresh_token: Option<String>,
}
impl StoredToken {
	/// Creates a record holding only an access token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None }
	}
}
impl Debug for StoredToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StoredToken")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

fn validate_app_id(view: &str) -> Result<(), CredentialError> {
	if view.is_empty() {
		return Err(CredentialError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(CredentialError::ContainsWhitespace);
	}
	if view.len() > APP_ID_MAX_LEN {
		return Err(CredentialError::TooLong { max: APP_ID_MAX_LEN });
	}

	Ok(())
}
