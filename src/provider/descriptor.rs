//! Provider descriptor data structures and helpers shared by all flows.
//!
//! The module exposes validated metadata, the builder used to assemble it, and the cache
//! TTL policy so deployments can describe the upstream API in a transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Cache lifetime policies.
pub mod ttl;

pub use builder::*;
pub use ttl::*;

// self
use crate::{
	_prelude::*,
	auth::{AppCredentials, TokenSecret},
};

/// Upstream endpoints consumed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiEndpoint {
	/// `GET token?grant_type=client_credential` access token endpoint.
	Token,
	/// `GET ticket/getticket?type=jsapi` ticket endpoint.
	Ticket,
}
impl ApiEndpoint {
	/// Returns a stable label suitable for errors, spans, or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ApiEndpoint::Token => "token",
			ApiEndpoint::Ticket => "ticket",
		}
	}
}
impl Display for ApiEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Access token endpoint.
	pub token: Url,
	/// `jsapi` ticket endpoint.
	pub ticket: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Lifetime policy for cached tokens and tickets.
	pub ttl_policy: TtlPolicy,
	/// Number of characters in generated nonces.
	pub nonce_len: usize,
}
impl ProviderDescriptor {
	/// Base path of the public WeChat API.
	pub const DEFAULT_BASE_URL: &'static str = "https://api.weixin.qq.com/cgi-bin/";

	/// Creates a new builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new()
	}

	/// Descriptor for the public WeChat API with default TTL and nonce settings.
	pub fn wechat() -> Result<Self, ProviderDescriptorError> {
		Self::builder().build()
	}

	/// Returns the URL of the provided endpoint.
	pub fn endpoint(&self, endpoint: ApiEndpoint) -> &Url {
		match endpoint {
			ApiEndpoint::Token => &self.endpoints.token,
			ApiEndpoint::Ticket => &self.endpoints.ticket,
		}
	}

	/// Builds the access token request URL. The result embeds the secret; never log it.
	pub fn token_request_url(&self, credentials: &AppCredentials) -> Url {
		let mut url = self.endpoints.token.clone();

		url.query_pairs_mut()
			.append_pair("grant_type", "client_credential")
			.append_pair("appid", &credentials.app_id)
			.append_pair("secret", credentials.app_secret.expose());

		url
	}

	/// Builds the `jsapi` ticket request URL. The result embeds the token; never log it.
	pub fn ticket_request_url(&self, access_token: &TokenSecret) -> Url {
		let mut url = self.endpoints.ticket.clone();

		url.query_pairs_mut()
			.append_pair("type", "jsapi")
			.append_pair("access_token", access_token.expose());

		url
	}
}
