//! Signature package assembly for client-side SDK configuration.
//!
//! A page that wants to call permission-gated SDK APIs hands the platform an app id, a
//! timestamp, a nonce, and a SHA-1 signature over
//! `jsapi_ticket=<ticket>&noncestr=<nonce>&timestamp=<timestamp>&url=<url>`. The four pairs are
//! concatenated in that literal order, which is also ascending ASCII order of the keys.
//!
//! Nonces come from [`rand::rng`]. They only have to be unique within the signature's short
//! validity window and are published to the page, so they are not treated as secrets.

// crates.io
use rand::Rng;
use sha1::{Digest, Sha1};
// self
use crate::{_prelude::*, auth::AppId};

/// Alphabet nonces are drawn from.
pub const NONCE_ALPHABET: &[u8; 62] =
	b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Nonce length used unless a descriptor overrides it.
pub const DEFAULT_NONCE_LEN: usize = 16;

/// Parameters a page passes to the SDK's configuration call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPackage {
	/// Application identifier.
	pub app_id: AppId,
	/// Unix timestamp in whole seconds.
	pub timestamp: i64,
	/// Page URL the signature covers.
	pub url: String,
	/// Random nonce included in the signed payload.
	pub nonce_str: String,
	/// Ticket the signature was computed with.
	pub jsapi_ticket: String,
	/// Lowercase hex SHA-1 digest of the canonical string.
	pub signature: String,
}
impl SignPackage {
	/// Assembles a package from explicit inputs, computing the signature.
	pub fn new(
		app_id: AppId,
		jsapi_ticket: impl Into<String>,
		nonce_str: impl Into<String>,
		timestamp: i64,
		url: impl Into<String>,
	) -> Self {
		let jsapi_ticket = jsapi_ticket.into();
		let nonce_str = nonce_str.into();
		let url = url.into();
		let signature = signature_for(&jsapi_ticket, &nonce_str, timestamp, &url);

		Self { app_id, timestamp, url, nonce_str, jsapi_ticket, signature }
	}
}

/// Builds the canonical string that gets hashed.
pub fn canonical_string(jsapi_ticket: &str, nonce_str: &str, timestamp: i64, url: &str) -> String {
	format!("jsapi_ticket={jsapi_ticket}&noncestr={nonce_str}&timestamp={timestamp}&url={url}")
}

/// Computes the lowercase hex SHA-1 signature of the canonical string.
pub fn signature_for(jsapi_ticket: &str, nonce_str: &str, timestamp: i64, url: &str) -> String {
	let mut hasher = Sha1::new();

	hasher.update(canonical_string(jsapi_ticket, nonce_str, timestamp, url).as_bytes());

	hex::encode(hasher.finalize())
}

/// Generates a nonce of `len` characters drawn uniformly from [`NONCE_ALPHABET`].
pub fn nonce_str(len: usize) -> String {
	let mut rng = rand::rng();

	(0..len)
		.map(|_| char::from(NONCE_ALPHABET[rng.random_range(0..NONCE_ALPHABET.len())]))
		.collect()
}

/// Drops any `#fragment`; the platform signs page URLs without it.
pub fn signable_url(url: &str) -> &str {
	url.split_once('#').map_or(url, |(head, _)| head)
}

/// Capability view over an incoming web request, used to rebuild the page URL.
///
/// Adapters for concrete web frameworks live outside this crate.
pub trait RequestContext {
	/// Value of the scheme-forwarding header (`X-Forwarded-Proto`), if any.
	fn forwarded_scheme(&self) -> Option<&str>;

	/// Host (and port, when non-default) the page was requested on.
	fn host(&self) -> &str;

	/// Request path, including the query string when the page has one.
	fn path(&self) -> &str;
}

/// Rebuilds `<scheme>://<host><path>` from a request context.
///
/// The scheme is the first entry of the forwarded header, falling back to `http` when the
/// header is absent or blank.
pub fn page_url(ctx: &(impl RequestContext + ?Sized)) -> String {
	let scheme = ctx
		.forwarded_scheme()
		.and_then(|value| value.split(',').next())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.unwrap_or("http");

	format!("{scheme}://{}{}", ctx.host(), ctx.path())
}
