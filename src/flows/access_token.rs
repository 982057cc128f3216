//! Access token acquisition with caching + singleflight guards.
//!
//! [`Broker::access_token`] exchanges the application credentials for a short-lived token and
//! caches it under the application's [`StoreKey`]. Concurrent misses share one upstream call.

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
	provider::ApiEndpoint,
	store::StoreKey,
};

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
	access_token: Option<String>,
	expires_in: Option<i64>,
	errcode: Option<i64>,
	errmsg: Option<String>,
}

impl<C> Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Returns a valid access token, calling the token endpoint only on a cache miss.
	pub async fn access_token(&self) -> Result<TokenSecret> {
		self.access_token_with(FetchOptions::default()).await
	}

	/// Same as [`Broker::access_token`] with explicit cache policy.
	pub async fn access_token_with(&self, options: FetchOptions) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::AccessToken;

		let span = FlowSpan::new(KIND, "access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.token_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let key = StoreKey::new(self.app_id(), CredentialKind::AccessToken);
				let guard = common::flow_guard(self, &key);
				let _singleflight = guard.lock().await;

				if let Some(current) = common::cached_record(self, &key, &options).await? {
					self.token_metrics.record_cache_hit();

					return Ok(current.value);
				}

				let record = self.fetch_access_token().await?;
				let value = record.value.clone();

				self.store.save(record).await?;

				Ok(value)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => {
				self.token_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn fetch_access_token(&self) -> Result<CredentialRecord> {
		const ENDPOINT: ApiEndpoint = ApiEndpoint::Token;

		self.token_metrics.record_fetch();

		let url = self.descriptor.token_request_url(&self.credentials);
		let response: AccessTokenResponse = common::call_api(self, ENDPOINT, url).await?;

		// The token endpoint omits `errcode` on success.
		common::check_errcode(self, ENDPOINT, response.errcode, response.errmsg, false)
			.map_err(|(_, err)| err)?;

		let value = common::required_field(ENDPOINT, "access_token", response.access_token)?;
		let issued_at = OffsetDateTime::now_utc();
		let ttl = self.descriptor.ttl_policy.resolve(response.expires_in);

		CredentialRecord::builder(self.app_id().clone(), CredentialKind::AccessToken)
			.value(value)
			.issued_at(issued_at)
			.expires_at(issued_at + ttl)
			.build()
			.map_err(common::map_record_builder_error)
	}
}
