//! Flow orchestrators: access token → `jsapi` ticket → signature package.

pub mod common;
pub mod metrics;

mod access_token;
mod jsapi_ticket;
mod sign_package;

pub use common::*;
pub use metrics::*;

// self
use crate::{
	_prelude::*,
	auth::{AppCredentials, AppId},
	http::ApiHttpClient,
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	store::{BrokerStore, StoreKey},
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient, store::MemoryStore};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient>;

/// Issues signature packages for a single application against one upstream API.
///
/// The broker owns the HTTP client, credential store, provider descriptor, and strategy
/// references so the individual flows only deal with their own endpoint. Cache keys are
/// namespaced by the application id, so several brokers may share one store. Each key gets a
/// singleflight guard: concurrent cache misses wait for the first caller's upstream call
/// instead of issuing their own. Guards are shared between clones of a broker, not between
/// independently constructed brokers.
pub struct Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// HTTP client used for every upstream request.
	pub http_client: Arc<C>,
	/// Cache holding access tokens and tickets.
	pub store: Arc<dyn BrokerStore>,
	/// Upstream endpoints, TTL policy, and signature parameters.
	pub descriptor: ProviderDescriptor,
	/// Strategy that classifies upstream error codes.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Long-lived application credentials.
	pub credentials: AppCredentials,
	/// Counters for the access token flow.
	pub token_metrics: Arc<FetchMetrics>,
	/// Counters for the ticket flow.
	pub ticket_metrics: Arc<FetchMetrics>,
	flow_guards: Arc<Mutex<HashMap<StoreKey, Arc<AsyncMutex<()>>>>>,
}
impl<C> Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn BrokerStore>,
		descriptor: ProviderDescriptor,
		credentials: AppCredentials,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			descriptor,
			strategy: Arc::new(DefaultProviderStrategy),
			credentials,
			token_metrics: Default::default(),
			ticket_metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Replaces the error-classification strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Application this broker signs for.
	pub fn app_id(&self) -> &AppId {
		&self.credentials.app_id
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient> {
	/// Creates a broker for the public API with an in-memory store and a default reqwest
	/// transport.
	pub fn new(credentials: AppCredentials) -> Result<Self> {
		let descriptor = ProviderDescriptor::wechat().map_err(ConfigError::from)?;

		Ok(Self::with_http_client(
			Arc::new(MemoryStore::default()),
			descriptor,
			credentials,
			ReqwestHttpClient::default(),
		))
	}
}
impl<C> Clone for Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			descriptor: self.descriptor.clone(),
			strategy: self.strategy.clone(),
			credentials: self.credentials.clone(),
			token_metrics: self.token_metrics.clone(),
			ticket_metrics: self.ticket_metrics.clone(),
			flow_guards: self.flow_guards.clone(),
		}
	}
}
impl<C> Debug for Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("credentials", &self.credentials)
			.finish()
	}
}
