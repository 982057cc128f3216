// self
use crate::{
	_prelude::*,
	flows::Broker,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	sign::{self, RequestContext, SignPackage},
};

impl<C> Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Signs `url` with the current `jsapi` ticket.
	///
	/// The fragment is dropped before signing and the returned package carries the signed URL.
	/// Every call draws a fresh nonce and timestamp; only the ticket is cached.
	pub async fn sign_package(&self, url: &str) -> Result<SignPackage> {
		const KIND: FlowKind = FlowKind::SignPackage;

		let span = FlowSpan::new(KIND, "sign_package");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let ticket = self.jsapi_ticket().await?;
				let nonce = sign::nonce_str(self.descriptor.nonce_len);
				let timestamp = OffsetDateTime::now_utc().unix_timestamp();

				Ok(SignPackage::new(
					self.app_id().clone(),
					ticket.expose(),
					nonce,
					timestamp,
					sign::signable_url(url),
				))
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Signs the page URL rebuilt from an incoming request.
	pub async fn sign_package_for_request<R>(&self, request: &R) -> Result<SignPackage>
	where
		R: ?Sized + RequestContext,
	{
		let url = sign::page_url(request);

		self.sign_package(&url).await
	}
}
