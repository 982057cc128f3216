// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	provider::{ProviderDescriptor, ProviderEndpoints, TtlPolicy},
	sign,
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Base URL cannot carry relative endpoint paths.
	#[error("The base URL cannot be used to derive endpoints: {url}.")]
	InvalidBaseUrl {
		/// Base URL that failed validation.
		url: String,
		/// Underlying join failure, if any.
		#[source]
		source: Option<url::ParseError>,
	},
	/// Endpoints must use HTTPS (plain HTTP is accepted for loopback hosts only).
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Nonce length outside the supported range.
	#[error("Nonce length must be between 1 and {max}, got {len}.")]
	InvalidNonceLength {
		/// Requested length.
		len: usize,
		/// Maximum supported length.
		max: usize,
	},
	/// TTL policy would never produce a usable cache entry.
	#[error("The TTL policy must yield positive lifetimes.")]
	InvalidTtlPolicy,
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug, Default)]
pub struct ProviderDescriptorBuilder {
	/// Base URL endpoints are derived from when not set explicitly.
	pub base_url: Option<Url>,
	/// Explicit token endpoint.
	pub token_endpoint: Option<Url>,
	/// Explicit ticket endpoint.
	pub ticket_endpoint: Option<Url>,
	/// Cache lifetime policy.
	pub ttl_policy: TtlPolicy,
	/// Nonce length override.
	pub nonce_len: Option<usize>,
}
impl ProviderDescriptorBuilder {
	/// Longest nonce the builder accepts.
	pub const MAX_NONCE_LEN: usize = 64;

	/// Creates an empty builder targeting the public API.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the base URL used to derive `token` and `ticket/getticket`.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the ticket endpoint.
	pub fn ticket_endpoint(mut self, url: Url) -> Self {
		self.ticket_endpoint = Some(url);

		self
	}

	/// Overrides the cache lifetime policy.
	pub fn ttl_policy(mut self, policy: TtlPolicy) -> Self {
		self.ttl_policy = policy;

		self
	}

	/// Overrides the nonce length (defaults to 16).
	pub fn nonce_len(mut self, len: usize) -> Self {
		self.nonce_len = Some(len);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let base = match self.base_url {
			Some(url) => url,
			None => Url::parse(ProviderDescriptor::DEFAULT_BASE_URL).map_err(|source| {
				ProviderDescriptorError::InvalidBaseUrl {
					url: ProviderDescriptor::DEFAULT_BASE_URL.into(),
					source: Some(source),
				}
			})?,
		};
		let token = match self.token_endpoint {
			Some(url) => url,
			None => derive_endpoint(&base, "token")?,
		};
		let ticket = match self.ticket_endpoint {
			Some(url) => url,
			None => derive_endpoint(&base, "ticket/getticket")?,
		};
		let descriptor = ProviderDescriptor {
			endpoints: ProviderEndpoints { token, ticket },
			ttl_policy: self.ttl_policy,
			nonce_len: self.nonce_len.unwrap_or(sign::DEFAULT_NONCE_LEN),
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("ticket", &self.endpoints.ticket)?;

		if self.nonce_len == 0 || self.nonce_len > ProviderDescriptorBuilder::MAX_NONCE_LEN {
			return Err(ProviderDescriptorError::InvalidNonceLength {
				len: self.nonce_len,
				max: ProviderDescriptorBuilder::MAX_NONCE_LEN,
			});
		}
		if !self.ttl_policy.is_valid() {
			return Err(ProviderDescriptorError::InvalidTtlPolicy);
		}

		Ok(())
	}
}

fn derive_endpoint(base: &Url, path: &str) -> Result<Url, ProviderDescriptorError> {
	if base.cannot_be_a_base() || base.query().is_some() {
		return Err(ProviderDescriptorError::InvalidBaseUrl { url: base.to_string(), source: None });
	}

	let mut base = base.clone();

	if !base.path().ends_with('/') {
		let path = format!("{}/", base.path());

		base.set_path(&path);
	}

	base.join(path).map_err(|source| ProviderDescriptorError::InvalidBaseUrl {
		url: base.to_string(),
		source: Some(source),
	})
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
