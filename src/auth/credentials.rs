//! Long-lived application credentials exchanged for short-lived tokens.

// self
use crate::{
	_prelude::*,
	auth::{AppId, IdentifierError, TokenSecret},
};

/// Application identifier + secret pair held for the broker's lifetime.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCredentials {
	/// Public application identifier (`appid`).
	pub app_id: AppId,
	/// Application secret; never logged.
	pub app_secret: TokenSecret,
}
impl AppCredentials {
	/// Validates the identifier and wraps both halves.
	pub fn new(
		app_id: impl AsRef<str>,
		app_secret: impl Into<String>,
	) -> Result<Self, IdentifierError> {
		Ok(Self { app_id: AppId::new(app_id)?, app_secret: TokenSecret::new(app_secret) })
	}
}
impl Debug for AppCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppCredentials")
			.field("app_id", &self.app_id)
			.field("app_secret", &"<redacted>")
			.finish()
	}
}
