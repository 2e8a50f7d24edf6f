//! Thread-safe in-memory [`TokenStore`] with lazy TTL eviction, for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::StoredToken,
	store::{CacheKey, StoreEntry, StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<CacheKey, StoreEntry>>>;

/// In-process token cache backing unit tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn get_now(map: StoreMap, key: CacheKey) -> Option<StoredToken> {
		let now = OffsetDateTime::now_utc();

		{
			let guard = map.read();

			match guard.get(&key) {
				Some(entry) if !entry.is_expired_at(now) => return Some(entry.token.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		// Expired entry observed under the read lock; re-check before evicting so a
		// concurrent writer's fresh entry survives.
		let mut guard = map.write();

		if guard.get(&key).is_some_and(|entry| entry.is_expired_at(now)) {
			guard.remove(&key);
		}

		None
	}

	fn set_now(map: StoreMap, key: CacheKey, token: StoredToken, ttl: Duration) {
		map.write().insert(key, StoreEntry::new(token, ttl));
	}

	fn delete_now(map: StoreMap, key: CacheKey) {
		map.write().remove(&key);
	}
}
impl TokenStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<StoredToken>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn set<'a>(
		&'a self,
		key: &'a CacheKey,
		token: StoredToken,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move {
			Self::set_now(map, key, token, ttl);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move {
			Self::delete_now(map, key);

			Ok(())
		})
	}
}
