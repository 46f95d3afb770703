//! Cached bearer token model.

// self
use crate::{_prelude::*, auth::Secret};

/// Bearer token plus the instant it stops being accepted.
///
/// An empty value is never valid, so the cache treats it like a missing token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BearerToken {
	value: Secret,
	/// Expiry taken from the token's `exp` claim or the fallback lifetime.
	pub expires_at: OffsetDateTime,
}
impl BearerToken {
	/// Tokens expiring within this window are treated as already expired.
	pub const REFRESH_MARGIN: Duration = Duration::minutes(5);

	/// Wraps a token value with its expiry.
	pub fn new(value: impl Into<Secret>, expires_at: OffsetDateTime) -> Self {
		Self { value: value.into(), expires_at }
	}

	/// Returns the token value.
	pub fn secret(&self) -> &Secret {
		&self.value
	}

	/// Returns `true` while `now + REFRESH_MARGIN` is still before the expiry.
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		!self.value.is_empty() && now + Self::REFRESH_MARGIN < self.expires_at
	}
}
