//! Transport primitives for upstream API calls.
//!
//! The module exposes [`ApiHttpClient`] alongside [`ApiResponse`] and [`ResponseMetadata`] so
//! downstream crates can plug in their own HTTP stack. The broker only ever issues `GET`
//! requests whose parameters live in the query string, so the contract is a single method.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// Boxed future returned by [`ApiHttpClient::get`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<ApiResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of issuing the broker's upstream `GET` calls.
///
/// The trait acts as the broker's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so they can be shared across broker instances behind an `Arc`,
/// and the returned futures must be `Send` so broker futures can hop executors. Timeouts are
/// the transport's responsibility; the broker never cancels a request.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Issues a `GET` for `url` and returns the raw response.
	///
	/// Implementations should return `Err` only for failures below HTTP (DNS, connect, TLS,
	/// body read); non-success statuses are reported through [`ResponseMetadata::status`].
	fn get(&self, url: Url) -> HttpFuture<'_, Self::TransportError>;
}

/// Metadata captured from an upstream HTTP response.
///
/// Additional metadata fields may be added in future releases, so downstream code
/// should construct values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Returns `true` unless the status is known and outside `200..300`.
	pub fn is_success(&self) -> bool {
		self.status.is_none_or(|status| (200..300).contains(&status))
	}
}

/// Raw upstream response handed back to the broker.
#[derive(Clone, Debug, Default)]
pub struct ApiResponse {
	/// Status + retry hints.
	pub metadata: ResponseMetadata,
	/// Undecoded response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Builds a `200 OK` response with the given body.
	pub fn ok(body: impl Into<Vec<u8>>) -> Self {
		Self { metadata: ResponseMetadata { status: Some(200), retry_after: None }, body: body.into() }
	}

	/// Overrides the status code.
	pub fn with_status(mut self, status: u16) -> Self {
		self.metadata.status = Some(status);

		self
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Upstream calls should not follow redirects to unrelated hosts while carrying the
/// application secret in the query string; configure any custom [`ReqwestClient`]
/// accordingly, and give it a request timeout since the broker never applies one.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn get(&self, url: Url) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.get(url).send().await?;
			let status = response.status();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse {
				metadata: ResponseMetadata { status: Some(status.as_u16()), retry_after },
				body,
			})
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return Some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
