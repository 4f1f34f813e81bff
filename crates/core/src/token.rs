//! Pure functions for bearer credential lifetimes.
//!
//! A credential is renewed once 90% of its issued lifetime has elapsed, so a
//! token handed to a caller always has some validity left for the request
//! that is about to use it.

use std::time::{Duration, Instant};

use serde::Deserialize;

/// Fraction of the issued lifetime after which a credential is renewed.
pub const REFRESH_FACTOR: f64 = 0.9;

/// Longest issued lifetime honored, in seconds. Longer grants are treated as
/// one day.
pub const MAX_EXPIRES_IN: u64 = 86_400;

/// Successful response body from an OAuth token endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    /// Issued lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Returns how long a credential issued for `expires_in` seconds may be reused.
///
/// `expires_in` is capped at [`MAX_EXPIRES_IN`].
///
/// ```
/// use std::time::Duration;
/// use agendakit_core::token::usable_lifetime;
///
/// assert_eq!(usable_lifetime(3600), Duration::from_secs(3240));
/// ```
pub fn usable_lifetime(expires_in: u64) -> Duration {
    Duration::from_secs(expires_in.min(MAX_EXPIRES_IN)).mul_f64(REFRESH_FACTOR)
}

/// Returns the instant after which a credential issued at `issued_at` must be renewed.
///
/// If the deadline cannot be represented the credential is due immediately.
pub fn renewal_deadline(issued_at: Instant, expires_in: u64) -> Instant {
    issued_at
        .checked_add(usable_lifetime(expires_in))
        .unwrap_or(issued_at)
}

/// Returns true while a credential may still be handed out.
pub fn is_reusable(expires_at: Instant, now: Instant) -> bool {
    now < expires_at
}
