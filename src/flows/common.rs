//! Shared helpers for flow implementations (cache policy, guards, upstream calls).

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{CredentialRecord, CredentialRecordBuilderError},
	error::{ConfigError, TransientError, TransportError},
	flows::Broker,
	http::ApiHttpClient,
	obs,
	provider::{ApiEndpoint, ApiErrorContext, ProviderErrorKind},
	store::StoreKey,
};

/// Cache policy knobs for a single token or ticket lookup.
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
	/// Bypasses the cache when true.
	pub force: bool,
	/// Treats records expiring within this window as stale (jittered per key).
	pub preemptive_window: Duration,
}
impl FetchOptions {
	/// Serves cached records until they expire.
	pub fn new() -> Self {
		Self::default()
	}

	/// Forces an upstream call regardless of the cache.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force = force;

		self
	}

	/// Overrides the preemptive window (defaults to zero).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Determines whether the cached record must be replaced.
	pub fn should_refresh(&self, record: &CredentialRecord, now: OffsetDateTime) -> bool {
		if self.force || record.is_expired_at(now) {
			return true;
		}

		let effective_window = self.effective_preemptive_window(record);

		if effective_window.is_zero() {
			return false;
		}

		record.remaining_at(now) <= effective_window
	}

	fn effective_preemptive_window(&self, record: &CredentialRecord) -> Duration {
		self.preemptive_window.checked_sub(self.preemptive_jitter(record)).unwrap_or(Duration::ZERO)
	}

	fn preemptive_jitter(&self, record: &CredentialRecord) -> Duration {
		let window_secs = self.preemptive_window.whole_seconds();

		if window_secs <= 1 {
			return Duration::ZERO;
		}

		let modulus = u64::try_from(window_secs).unwrap_or(u64::MAX);
		let mut hasher = DefaultHasher::new();

		StoreKey::of(record).hash(&mut hasher);

		let jitter_secs = hasher.finish() % modulus;

		Duration::seconds(i64::try_from(jitter_secs).unwrap_or(i64::MAX))
	}
}

/// Returns (and creates on demand) the singleflight guard for a store key.
pub(crate) fn flow_guard<C>(broker: &Broker<C>, key: &StoreKey) -> Arc<AsyncMutex<()>>
where
	C: ?Sized + ApiHttpClient,
{
	let mut guards = broker.flow_guards.lock();

	guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Returns the cached record under `key` when `options` allow serving it.
pub(crate) async fn cached_record<C>(
	broker: &Broker<C>,
	key: &StoreKey,
	options: &FetchOptions,
) -> Result<Option<CredentialRecord>>
where
	C: ?Sized + ApiHttpClient,
{
	let now = OffsetDateTime::now_utc();
	let record = broker
		.store
		.fetch(key)
		.await?
		.filter(|record| !options.should_refresh(record, now));

	if let Some(record) = &record {
		obs::record_cache_hit(key, record.expires_at);
	}

	Ok(record)
}

/// Issues one upstream `GET` and decodes the JSON body.
///
/// Transport failures, non-2xx statuses, and undecodable bodies all map into the
/// retry-later error classes; `errcode` inspection is left to the caller.
pub(crate) async fn call_api<C, T>(
	broker: &Broker<C>,
	endpoint: ApiEndpoint,
	url: Url,
) -> Result<T>
where
	C: ?Sized + ApiHttpClient,
	T: DeserializeOwned,
{
	obs::record_upstream_call(endpoint, &broker.credentials.app_id);

	let response = broker.http_client.get(url).await.map_err(TransportError::network)?;
	let status = response.metadata.status;

	if let Some(code) = status.filter(|_| !response.metadata.is_success()) {
		return Err(TransientError::UnexpectedStatus {
			endpoint,
			status: code,
			retry_after: response.metadata.retry_after,
		}
		.into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransientError::ResponseParse { endpoint, source, status }.into())
}

/// Fails when the upstream reported a nonzero `errcode`.
///
/// With `required`, a missing `errcode` counts as a malformed response instead of success.
pub(crate) fn check_errcode<C>(
	broker: &Broker<C>,
	endpoint: ApiEndpoint,
	errcode: Option<i64>,
	errmsg: Option<String>,
	required: bool,
) -> Result<(), (ProviderErrorKind, Error)>
where
	C: ?Sized + ApiHttpClient,
{
	match errcode {
		Some(0) => Ok(()),
		None if !required => Ok(()),
		None => Err((
			ProviderErrorKind::Transient,
			TransientError::MissingField { endpoint, field: "errcode" }.into(),
		)),
		Some(code) => {
			let ctx = ApiErrorContext::new(endpoint, code).with_errmsg(errmsg.unwrap_or_default());
			let kind = broker.strategy.classify_api_error(&ctx);

			Err((kind, ctx.into_error(kind)))
		},
	}
}

/// Extracts a non-empty string field or reports it missing.
pub(crate) fn required_field(
	endpoint: ApiEndpoint,
	field: &'static str,
	value: Option<String>,
) -> Result<String> {
	value
		.filter(|value| !value.is_empty())
		.ok_or_else(|| TransientError::MissingField { endpoint, field }.into())
}

/// Normalizes record builder errors into broker errors.
pub(crate) fn map_record_builder_error(err: CredentialRecordBuilderError) -> Error {
	ConfigError::from(err).into()
}
