//! `jsapi` ticket acquisition chained on the access token flow.
//!
//! A cache miss resolves the access token first (possibly from cache), then calls the ticket
//! endpoint once. The ticket guard stays held while the token guard is taken, both for the
//! token lookup and for evicting a rejected token, so the lock order is always ticket → token.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, CredentialRecord, TokenSecret},
	flows::{
		Broker,
		common::{self, FetchOptions},
	},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ApiEndpoint, ProviderErrorKind},
	store::{EvictOutcome, StoreKey},
};

#[derive(Debug, Deserialize)]
struct TicketResponse {
	errcode: Option<i64>,
	errmsg: Option<String>,
	ticket: Option<String>,
	expires_in: Option<i64>,
}

impl<C> Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Returns a valid `jsapi` ticket, calling upstream only on a cache miss.
	pub async fn jsapi_ticket(&self) -> Result<TokenSecret> {
		self.jsapi_ticket_with(FetchOptions::default()).await
	}

	/// Same as [`Broker::jsapi_ticket`] with explicit cache policy.
	///
	/// `options` apply to the ticket only; the access token is resolved with default options.
	pub async fn jsapi_ticket_with(&self, options: FetchOptions) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::JsapiTicket;

		let span = FlowSpan::new(KIND, "jsapi_ticket");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.ticket_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let key = StoreKey::new(self.app_id(), CredentialKind::JsapiTicket);
				let guard = common::flow_guard(self, &key);
				let _singleflight = guard.lock().await;

				if let Some(current) = common::cached_record(self, &key, &options).await? {
					self.ticket_metrics.record_cache_hit();

					return Ok(current.value);
				}

				let access_token = self.access_token().await?;
				let record = self.fetch_jsapi_ticket(&access_token).await?;
				let value = record.value.clone();

				self.store.save(record).await?;

				Ok(value)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => {
				self.ticket_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn fetch_jsapi_ticket(&self, access_token: &TokenSecret) -> Result<CredentialRecord> {
		const ENDPOINT: ApiEndpoint = ApiEndpoint::Ticket;

		self.ticket_metrics.record_fetch();

		let url = self.descriptor.ticket_request_url(access_token);
		let response: TicketResponse = common::call_api(self, ENDPOINT, url).await?;

		if let Err((kind, err)) =
			common::check_errcode(self, ENDPOINT, response.errcode, response.errmsg, true)
		{
			if kind == ProviderErrorKind::InvalidAccessToken {
				self.evict_access_token(access_token, response.errcode.unwrap_or_default()).await;
			}

			return Err(err);
		}

		let value = common::required_field(ENDPOINT, "ticket", response.ticket)?;
		let issued_at = OffsetDateTime::now_utc();
		let ttl = self.descriptor.ttl_policy.resolve(response.expires_in);

		CredentialRecord::builder(self.app_id().clone(), CredentialKind::JsapiTicket)
			.value(value)
			.issued_at(issued_at)
			.expires_at(issued_at + ttl)
			.build()
			.map_err(common::map_record_builder_error)
	}

	/// Drops the rejected token so the next call re-acquires it.
	///
	/// Runs under the token guard (ticket → token order) and only removes the record while it
	/// still holds `rejected`; a newer token saved meanwhile is kept. Store failures are logged
	/// so the caller still sees the upstream verdict.
	async fn evict_access_token(&self, rejected: &TokenSecret, errcode: i64) {
		let key = StoreKey::new(self.app_id(), CredentialKind::AccessToken);
		let guard = common::flow_guard(self, &key);
		let _singleflight = guard.lock().await;

		match self.store.compare_and_evict(&key, rejected.expose()).await {
			Ok(EvictOutcome::Evicted) => obs::record_eviction(&key, errcode),
			Ok(EvictOutcome::Mismatch | EvictOutcome::Missing) => {},
			Err(err) => obs::record_eviction_failure(&key, &err),
		}
	}
}
