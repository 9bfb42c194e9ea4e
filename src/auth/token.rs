//! Token records and expiry bookkeeping.

use serde::{Deserialize, Serialize};

/// Subtracted from every computed expiry so a token is never presented
/// right at the edge of its lifetime.
pub const EXPIRY_MARGIN_MS: i64 = 20_000;

/// Cached result of a successful grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Absolute expiry in milliseconds since the Unix epoch, always derived
    /// locally from `expires_in`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<i64>,
}

/// Body returned by the token endpoint for every grant type.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenRecord {
    pub fn from_response(response: TokenResponse, now_ms: i64) -> Self {
        let expires_on = response
            .expires_in
            .map(|expires_in| compute_expires_on(now_ms, expires_in));

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            expires_on,
        }
    }

    /// A token without a known expiry is treated as expired.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.expires_on.is_some_and(|expires_on| expires_on > now_ms)
    }
}

pub fn compute_expires_on(now_ms: i64, expires_in_secs: u64) -> i64 {
    let lifetime_ms = i64::try_from(expires_in_secs)
        .unwrap_or(i64::MAX / 1000)
        .saturating_mul(1000);
    now_ms
        .saturating_add(lifetime_ms)
        .saturating_sub(EXPIRY_MARGIN_MS)
}

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}
