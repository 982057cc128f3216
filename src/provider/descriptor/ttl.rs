// self
use crate::_prelude::*;

/// Decides how long a fetched credential stays in the broker cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TtlPolicy {
	/// Cache every credential for the same fixed duration, ignoring `expires_in`.
	Fixed {
		/// Lifetime applied to each record.
		ttl: Duration,
	},
	/// Trust the upstream `expires_in` minus a safety margin.
	Upstream {
		/// Subtracted from `expires_in` so records expire before the upstream copy.
		safety_margin: Duration,
		/// Lifetime used when the response omits `expires_in`.
		fallback: Duration,
	},
}
impl TtlPolicy {
	/// Lifetime the platform documents for access tokens and tickets.
	pub const DEFAULT_TTL: Duration = Duration::seconds(7200);

	/// Resolves the cache lifetime for a response carrying `expires_in` seconds.
	pub fn resolve(self, expires_in: Option<i64>) -> Duration {
		match self {
			TtlPolicy::Fixed { ttl } => ttl,
			TtlPolicy::Upstream { safety_margin, fallback } => match expires_in {
				Some(secs) if secs > 0 => {
					let upstream = Duration::seconds(secs);
					let trimmed = upstream - safety_margin;

					if trimmed.is_positive() { trimmed } else { upstream }
				},
				_ => fallback,
			},
		}
	}

	pub(crate) fn is_valid(self) -> bool {
		match self {
			TtlPolicy::Fixed { ttl } => ttl.is_positive(),
			TtlPolicy::Upstream { safety_margin, fallback } =>
				!safety_margin.is_negative() && fallback.is_positive(),
		}
	}
}
impl Default for TtlPolicy {
	fn default() -> Self {
		Self::Fixed { ttl: Self::DEFAULT_TTL }
	}
}
