//! Storage contracts and built-in token-cache implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AppId, AppSecret, StoredToken, TokenKind},
};

/// Boxed future returned by [`TokenStore`] implementations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value contract implemented by token caches.
///
/// Implementations must honor TTL-based expiry: an entry is never returned once its deadline
/// passes, and it is evicted no later than the first `get` afterwards. Entries are immutable
/// value objects, so concurrent writers can only race towards last-writer-wins.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the live token cached under `key`, if any.
	fn get<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<StoredToken>>;

	/// Persists or replaces the token cached under `key`, expiring after `ttl`.
	fn set<'a>(
		&'a self,
		key: &'a CacheKey,
		token: StoredToken,
		ttl: Duration,
	) -> StoreFuture<'a, ()>;

	/// Removes the entry cached under `key`; removing a missing key is a no-op.
	fn delete<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures (e.g., serde) surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Deterministic composite key identifying one cached token.
///
/// The key combines the application identity, a truncated digest of the secret, and the token
/// kind. Rotating the secret changes the digest fragment, so every token minted under the old
/// secret becomes a guaranteed cache miss.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
	/// Application identifier component.
	pub app_id: AppId,
	/// Truncated secret digest component.
	pub secret_fragment: String,
	/// Token kind discriminator.
	pub kind: TokenKind,
}
impl CacheKey {
	/// Builds a key for the provided credentials and token kind.
	pub fn new(app_id: &AppId, secret: &AppSecret, kind: TokenKind) -> Self {
		Self { app_id: app_id.clone(), secret_fragment: secret.cache_fragment(), kind }
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:{}:{}", self.app_id, self.secret_fragment, self.kind)
	}
}

/// Stored token value plus its absolute expiry instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
	/// Cached token value.
	pub token: StoredToken,
	/// Instant after which the entry must never be returned.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl StoreEntry {
	/// Builds an entry expiring `ttl` from now.
	pub fn new(token: StoredToken, ttl: Duration) -> Self {
		Self { token, expires_at: OffsetDateTime::now_utc() + ttl }
	}

	/// Returns `true` once the entry has reached its deadline.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
