//! Credential kinds cached by the broker.

// self
use crate::_prelude::*;

/// Short-lived credential kinds issued by the upstream API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialKind {
	/// Access token exchanged for the application secret.
	AccessToken,
	/// `jsapi` capability ticket exchanged for an access token.
	JsapiTicket,
}
impl CredentialKind {
	/// Returns the stable cache label for the kind.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::AccessToken => "accessToken",
			CredentialKind::JsapiTicket => "jsapiTicket",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
