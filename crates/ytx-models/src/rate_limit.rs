//! Rate-limit bucket value type (§3, §4.6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitBucket {
    pub tokens: f64,
    pub last_refill_at_unix_ms: i64,
}

impl RateLimitBucket {
    pub fn full(capacity: f64, now_unix_ms: i64) -> Self {
        Self {
            tokens: capacity,
            last_refill_at_unix_ms: now_unix_ms,
        }
    }
}

/// Outcome of a single rate-limit check (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RateLimitOutcome {
    Allow { remaining: f64, reset_at_unix_ms: i64 },
    Deny { retry_after_seconds: f64, reset_at_unix_ms: i64 },
}
