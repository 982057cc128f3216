//! Storage contracts and the built-in in-memory store for cached credentials.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AppId, CredentialKind, CredentialRecord},
};

/// Boxed future returned by [`BrokerStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Cache backend contract implemented by broker credential stores.
///
/// Stores only hold data; freshness decisions belong to the broker, which compares
/// [`CredentialRecord::expires_at`] against the clock on every read.
pub trait BrokerStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the record under its [`StoreKey`].
	fn save(&self, record: CredentialRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record stored under `key`, if present.
	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CredentialRecord>>;

	/// Removes and returns the record stored under `key`, if present.
	fn evict<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CredentialRecord>>;

	/// Removes the record under `key` only while its value still equals `expected`.
	///
	/// The comparison and removal must be atomic with respect to concurrent [`save`] calls, so
	/// a credential written after `expected` was issued survives.
	///
	/// [`save`]: BrokerStore::save
	fn compare_and_evict<'a>(
		&'a self,
		key: &'a StoreKey,
		expected: &'a str,
	) -> StoreFuture<'a, EvictOutcome>;
}

/// Result of a [`BrokerStore::compare_and_evict`] attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictOutcome {
	/// The stored value matched and the record was removed.
	Evicted,
	/// A record exists but holds a different value; it was kept.
	Mismatch,
	/// No record was stored under the key.
	Missing,
}

/// Error type produced by [`BrokerStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
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

/// Composite cache key: one slot per application and credential kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Application the credential belongs to.
	pub app_id: AppId,
	/// Credential kind stored in the slot.
	pub kind: CredentialKind,
}
impl StoreKey {
	/// Builds a key for the provided application + kind.
	pub fn new(app_id: &AppId, kind: CredentialKind) -> Self {
		Self { app_id: app_id.clone(), kind }
	}

	/// Builds the key a record is stored under.
	pub fn of(record: &CredentialRecord) -> Self {
		Self::new(&record.app_id, record.kind)
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:{}", self.app_id, self.kind)
	}
}
