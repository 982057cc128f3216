//! Broker-level error types shared across flows, providers, and stores.

// self
use crate::{_prelude::*, provider::ApiEndpoint};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Upstream rejected the application credentials (`appid`/`secret`).
	#[error("Upstream rejected the application credentials: {errcode} {errmsg}.")]
	InvalidCredentials {
		/// Upstream error code.
		errcode: i64,
		/// Upstream error message.
		errmsg: String,
	},
	/// Upstream rejected the access token presented to the ticket endpoint.
	#[error("Upstream rejected the access token: {errcode} {errmsg}.")]
	InvalidAccessToken {
		/// Upstream error code.
		errcode: i64,
		/// Upstream error message.
		errmsg: String,
	},
	/// Any other nonzero upstream error code.
	#[error("The {endpoint} endpoint rejected the request: {errcode} {errmsg}.")]
	Rejected {
		/// Endpoint that produced the error.
		endpoint: ApiEndpoint,
		/// Upstream error code.
		errcode: i64,
		/// Upstream error message.
		errmsg: String,
	},
}
impl Error {
	/// Returns `true` when calling again later may succeed without any configuration change.
	///
	/// Covers the "network error, retry later" class (transport and transient failures) plus
	/// rejected access tokens, whose cached copy is evicted before the error surfaces.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport(_) | Self::Transient(_) | Self::InvalidAccessToken { .. })
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Application credentials are malformed.
	#[error("Application credentials are invalid.")]
	InvalidCredentials(#[from] crate::auth::IdentifierError),
	/// Credential record builder validation failed.
	#[error("Unable to build credential record.")]
	RecordBuild(#[from] crate::auth::CredentialRecordBuilderError),
	/// Provider descriptor validation failed.
	#[error("Provider descriptor is invalid.")]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Upstream answered with a non-success HTTP status.
	#[error("The {endpoint} endpoint returned HTTP status {status}.")]
	UnexpectedStatus {
		/// Endpoint that was called.
		endpoint: ApiEndpoint,
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Upstream responded with malformed JSON that could not be parsed.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	ResponseParse {
		/// Endpoint that was called.
		endpoint: ApiEndpoint,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Upstream response parsed but lacks a required field.
	#[error("The {endpoint} endpoint response is missing `{field}`.")]
	MissingField {
		/// Endpoint that was called.
		endpoint: ApiEndpoint,
		/// Name of the absent field.
		field: &'static str,
	},
	/// Upstream reported a temporary condition (busy, rate limited).
	#[error("The {endpoint} endpoint is temporarily unavailable: {errcode} {errmsg}.")]
	Busy {
		/// Endpoint that was called.
		endpoint: ApiEndpoint,
		/// Upstream error code.
		errcode: i64,
		/// Upstream error message.
		errmsg: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream API; retry later.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream API; retry later.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
