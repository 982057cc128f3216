//! Cached credential records, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{
		AppId,
		token::{kind::CredentialKind, secret::TokenSecret},
	},
};

/// Current lifecycle status for a cached credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// Not yet valid because the issued-at instant is in the future.
	Pending,
	/// Currently valid.
	Active,
	/// Exceeded its expiry instant.
	Expired,
}

/// Errors produced by [`CredentialRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialRecordBuilderError {
	/// Issued when no credential value was provided.
	#[error("Credential value is required.")]
	MissingValue,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the expiry precedes the issued-at instant.
	#[error("Expiry must not precede the issued-at instant.")]
	ExpiresBeforeIssued,
}

/// Cached access token or `jsapi` ticket together with its local expiry.
#[derive(Serialize, Deserialize, Clone)]
pub struct CredentialRecord {
	/// Application the credential belongs to.
	pub app_id: AppId,
	/// Which credential this record holds.
	pub kind: CredentialKind,
	/// Credential value; callers must avoid logging it.
	pub value: TokenSecret,
	/// Instant the broker received the credential.
	pub issued_at: OffsetDateTime,
	/// Instant after which the cached copy must not be served.
	pub expires_at: OffsetDateTime,
}
impl CredentialRecord {
	/// Returns a builder for the given application + kind.
	pub fn builder(app_id: AppId, kind: CredentialKind) -> CredentialRecordBuilder {
		CredentialRecordBuilder::new(app_id, kind)
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> CredentialStatus {
		if instant < self.issued_at {
			return CredentialStatus::Pending;
		}
		if instant >= self.expires_at {
			return CredentialStatus::Expired;
		}

		CredentialStatus::Active
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> CredentialStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), CredentialStatus::Expired)
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		matches!(self.status(), CredentialStatus::Expired)
	}

	/// Time left before expiry; negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}
}
impl Debug for CredentialRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialRecord")
			.field("app_id", &self.app_id)
			.field("kind", &self.kind)
			.field("value", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`CredentialRecord`].
#[derive(Clone, Debug)]
pub struct CredentialRecordBuilder {
	app_id: AppId,
	kind: CredentialKind,
	value: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CredentialRecordBuilder {
	fn new(app_id: AppId, kind: CredentialKind) -> Self {
		Self { app_id, kind, value: None, issued_at: None, expires_at: None, expires_in: None }
	}

	/// Provides the credential value.
	pub fn value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(TokenSecret::new(value));

		self
	}

	/// Sets the issued-at instant (defaults to the current clock).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`CredentialRecord`].
	pub fn build(self) -> Result<CredentialRecord, CredentialRecordBuilderError> {
		let value = self
			.value
			.filter(|value| !value.is_empty())
			.ok_or(CredentialRecordBuilderError::MissingValue)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(CredentialRecordBuilderError::MissingExpiry),
		};

		if expires_at < issued_at {
			return Err(CredentialRecordBuilderError::ExpiresBeforeIssued);
		}

		Ok(CredentialRecord { app_id: self.app_id, kind: self.kind, value, issued_at, expires_at })
	}
}
