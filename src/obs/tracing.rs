// self
use crate::{
	_prelude::*,
	obs::FlowKind,
	provider::ApiEndpoint,
	store::{StoreError, StoreKey},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by broker flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("jssdk_broker.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a trace event when a cached credential is served.
pub fn record_cache_hit(key: &StoreKey, expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::trace!(key = %key, %expires_at, "served cached credential");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, expires_at);
	}
}

/// Emits a debug event before an upstream call.
///
/// Request URLs carry the application secret or an access token, so only the endpoint label
/// and the application id are recorded.
pub fn record_upstream_call(endpoint: ApiEndpoint, app_id: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(endpoint = endpoint.as_str(), app_id, "calling upstream endpoint");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (endpoint, app_id);
	}
}

/// Emits a warning when a cached credential is evicted after an upstream rejection.
pub fn record_eviction(key: &StoreKey, errcode: i64) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key = %key, errcode, "evicted cached credential rejected upstream");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, errcode);
	}
}

/// Emits a warning when evicting a rejected credential fails; the upstream error still wins.
pub fn record_eviction_failure(key: &StoreKey, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key = %key, %error, "failed to evict rejected credential");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, error);
	}
}
