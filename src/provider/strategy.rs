//! Provider strategy hooks that classify upstream `errcode` responses.
//!
//! The upstream API reports failures in-band as `{"errcode": <n>, "errmsg": "..."}`, usually
//! with HTTP 200. Strategies turn those codes into broker error kinds without tying flows to
//! any particular HTTP client.

// self
use crate::{_prelude::*, provider::ApiEndpoint};

/// Strategy hook that classifies upstream error codes.
///
/// Implementors are required to be `Send + Sync` so a single strategy can be shared by every
/// broker in the process.
pub trait ProviderStrategy: Send + Sync {
	/// Maps a nonzero upstream `errcode` into the broker taxonomy.
	fn classify_api_error(&self, ctx: &ApiErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// The application id or secret was rejected.
	InvalidCredentials,
	/// The access token presented to the ticket endpoint is invalid or expired.
	InvalidAccessToken,
	/// Failure is temporary (system busy, rate limited).
	Transient,
	/// Any other rejection.
	Rejected,
}

/// Context passed to provider strategies when classifying upstream errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiErrorContext {
	/// Endpoint that produced the error.
	pub endpoint: ApiEndpoint,
	/// Upstream `errcode`.
	pub errcode: i64,
	/// Upstream `errmsg`, empty when absent.
	pub errmsg: String,
}
impl ApiErrorContext {
	/// Creates a new context for the endpoint + code pair.
	pub fn new(endpoint: ApiEndpoint, errcode: i64) -> Self {
		Self { endpoint, errcode, errmsg: String::new() }
	}

	/// Adds the upstream message.
	pub fn with_errmsg(mut self, errmsg: impl Into<String>) -> Self {
		self.errmsg = errmsg.into();

		self
	}

	/// Converts the context into a broker [`Error`] of the given kind.
	pub fn into_error(self, kind: ProviderErrorKind) -> Error {
		let Self { endpoint, errcode, errmsg } = self;

		match kind {
			ProviderErrorKind::InvalidCredentials => Error::InvalidCredentials { errcode, errmsg },
			ProviderErrorKind::InvalidAccessToken => Error::InvalidAccessToken { errcode, errmsg },
			ProviderErrorKind::Transient =>
				crate::error::TransientError::Busy { endpoint, errcode, errmsg }.into(),
			ProviderErrorKind::Rejected => Error::Rejected { endpoint, errcode, errmsg },
		}
	}
}

/// Default strategy backed by the platform's published global return codes.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl DefaultProviderStrategy {
	/// System busy.
	pub const SYSTEM_BUSY: i64 = -1;
	/// Invalid credential or access token.
	pub const INVALID_CREDENTIAL: i64 = 40001;
	/// Invalid `appid`.
	pub const INVALID_APP_ID: i64 = 40013;
	/// Invalid access token.
	pub const INVALID_ACCESS_TOKEN: i64 = 40014;
	/// Invalid `secret`.
	pub const INVALID_APP_SECRET: i64 = 40125;
	/// Caller IP is not whitelisted.
	pub const IP_NOT_WHITELISTED: i64 = 40164;
	/// Missing `appid`.
	pub const MISSING_APP_ID: i64 = 41002;
	/// Missing `secret`.
	pub const MISSING_APP_SECRET: i64 = 41004;
	/// Access token expired.
	pub const ACCESS_TOKEN_EXPIRED: i64 = 42001;
	/// API call quota exhausted.
	pub const RATE_LIMITED: i64 = 45009;
}
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_api_error(&self, ctx: &ApiErrorContext) -> ProviderErrorKind {
		match (ctx.endpoint, ctx.errcode) {
			(_, Self::SYSTEM_BUSY | Self::RATE_LIMITED) => ProviderErrorKind::Transient,
			(
				ApiEndpoint::Ticket,
				Self::INVALID_CREDENTIAL | Self::INVALID_ACCESS_TOKEN | Self::ACCESS_TOKEN_EXPIRED,
			) => ProviderErrorKind::InvalidAccessToken,
			(
				ApiEndpoint::Token,
				Self::INVALID_CREDENTIAL
				| Self::INVALID_APP_ID
				| Self::INVALID_APP_SECRET
				| Self::IP_NOT_WHITELISTED
				| Self::MISSING_APP_ID
				| Self::MISSING_APP_SECRET,
			) => ProviderErrorKind::InvalidCredentials,
			_ => ProviderErrorKind::Rejected,
		}
	}
}
