//! Thread-safe in-memory [`BrokerStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::CredentialRecord,
	store::{BrokerStore, EvictOutcome, StoreError, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, CredentialRecord>>>;

/// Process-local store; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of records currently held, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when the store holds no records.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: StoreMap, record: CredentialRecord) -> Result<(), StoreError> {
		map.write().insert(StoreKey::of(&record), record);

		Ok(())
	}

	fn fetch_now(map: StoreMap, key: StoreKey) -> Option<CredentialRecord> {
		map.read().get(&key).cloned()
	}

	fn evict_now(map: StoreMap, key: StoreKey) -> Option<CredentialRecord> {
		map.write().remove(&key)
	}

	fn compare_and_evict_now(map: StoreMap, key: StoreKey, expected: &str) -> EvictOutcome {
		let mut guard = map.write();
		let outcome = match guard.get(&key) {
			None => EvictOutcome::Missing,
			Some(record) if record.value.expose() != expected => EvictOutcome::Mismatch,
			Some(_) => EvictOutcome::Evicted,
		};

		if outcome == EvictOutcome::Evicted {
			guard.remove(&key);
		}

		outcome
	}
}
impl BrokerStore for MemoryStore {
	fn save(&self, record: CredentialRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, record) })
	}

	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CredentialRecord>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::fetch_now(map, key)) })
	}

	fn evict<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CredentialRecord>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::evict_now(map, key)) })
	}

	fn compare_and_evict<'a>(
		&'a self,
		key: &'a StoreKey,
		expected: &'a str,
	) -> StoreFuture<'a, EvictOutcome> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::compare_and_evict_now(map, key, expected)) })
	}
}
