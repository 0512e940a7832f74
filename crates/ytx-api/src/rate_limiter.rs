//! Token-bucket rate limiter (C6): per-`(principal, endpoint)` budget
//! refilled proportionally to elapsed time and consumed one token per
//! request, backed by an atomic Lua script in Tier-2
//! ([`ytx_cache::Tier2Cache::take_rate_limit_token`]). Distinct from the
//! ambient per-IP `governor` throttle in `middleware.rs`, which is a blunt
//! defense-in-depth layer, not this contract.
//!
//! Grounded on the Redis Lua token-bucket idiom used by the pack's
//! distributed rate-limiting module (refill-then-consume in one round
//! trip via `EVAL`), adapted from that module's simulated in-memory
//! connection onto the real `redis` crate script API Tier-2 already uses.

use chrono::Utc;
use tracing::warn;
use ytx_cache::Tier2Cache;
use ytx_models::RateLimitOutcome;

/// Bucket state keys live for this long past last touch so an idle
/// principal's bucket doesn't pin memory forever in C3.
const BUCKET_KEY_TTL_SECONDS: u64 = 120;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub rate_per_minute: f64,
    pub burst: f64,
    /// §4.6: when C3 is unreachable, `fail_open` allows the request through
    /// instead of denying it. Default closed.
    pub fail_open: bool,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { rate_per_minute: 30.0, burst: 5.0, fail_open: false }
    }
}

impl RateLimiterConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            rate_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.rate_per_minute),
            burst: std::env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.burst),
            fail_open: std::env::var("RATE_LIMIT_FAIL_OPEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.fail_open),
        }
    }

    /// Initial/maximum bucket size: `rate + burst`, matching the
    /// rate-limit conservation property (§8: admissions per 60s window
    /// never exceed `rate + burst`).
    fn capacity(&self) -> f64 {
        self.rate_per_minute + self.burst
    }

    fn refill_per_ms(&self) -> f64 {
        self.rate_per_minute / 60_000.0
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    cache: Tier2Cache,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(cache: Tier2Cache, config: RateLimiterConfig) -> Self {
        Self { cache, config }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    fn bucket_key(principal: &str, endpoint: &str) -> String {
        format!("rl:{principal}:{endpoint}")
    }

    /// Refill then attempt to consume one token. On a C3 outage, behaviour
    /// follows the configured fail-open/fail-closed policy rather than
    /// propagating the cache error to the caller — a rate limiter that
    /// fails by throwing defeats its own purpose.
    pub async fn check(&self, principal: &str, endpoint: &str) -> RateLimitOutcome {
        let key = Self::bucket_key(principal, endpoint);
        let now_ms = Utc::now().timestamp_millis();

        match self
            .cache
            .take_rate_limit_token(&key, self.config.capacity(), self.config.refill_per_ms(), now_ms, BUCKET_KEY_TTL_SECONDS)
            .await
        {
            Ok((true, remaining)) => {
                RateLimitOutcome::Allow { remaining, reset_at_unix_ms: now_ms + self.ms_to_full(remaining) }
            }
            Ok((false, remaining)) => {
                let retry_after_seconds = self.seconds_to_next_token(remaining);
                RateLimitOutcome::Deny {
                    retry_after_seconds,
                    reset_at_unix_ms: now_ms + (retry_after_seconds * 1000.0) as i64,
                }
            }
            Err(e) => {
                warn!(error = %e, principal, endpoint, "rate limiter backend unreachable");
                if self.config.fail_open {
                    RateLimitOutcome::Allow { remaining: self.config.capacity(), reset_at_unix_ms: now_ms }
                } else {
                    RateLimitOutcome::Deny { retry_after_seconds: 1.0, reset_at_unix_ms: now_ms + 1000 }
                }
            }
        }
    }

    fn seconds_to_next_token(&self, remaining: f64) -> f64 {
        if remaining >= 1.0 {
            return 0.0;
        }
        let deficit = 1.0 - remaining;
        (deficit / self.config.refill_per_ms()) / 1000.0
    }

    fn ms_to_full(&self, remaining: f64) -> i64 {
        let deficit = (self.config.capacity() - remaining).max(0.0);
        (deficit / self.config.refill_per_ms()) as i64
    }

    /// Admin `rate_limit_reset(principal)` (§6): drops every endpoint
    /// bucket for a principal, restoring a full allowance on next request.
    pub async fn reset_principal(&self, principal: &str) -> ytx_cache::CacheResult<u64> {
        let pattern = format!("rl:{principal}:*");
        let keys = self.cache.scan_match(&pattern).await?;
        for key in &keys {
            self.cache.del(key).await?;
        }
        Ok(keys.len() as u64)
    }

    /// Admin `rate_limit_stats(principal)` (§6): current token count per
    /// endpoint the principal has touched. Cursor-based scan, per §5.
    pub async fn stats_for_principal(&self, principal: &str) -> ytx_cache::CacheResult<Vec<EndpointBucketStats>> {
        let prefix = format!("rl:{principal}:");
        let pattern = format!("{prefix}*:tokens");
        let keys = self.cache.scan_match(&pattern).await?;

        let mut stats = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(endpoint) = key.strip_prefix(&prefix).and_then(|s| s.strip_suffix(":tokens")) else {
                continue;
            };
            let tokens = self.cache.get_string(&key).await?.and_then(|s| s.parse::<f64>().ok());
            stats.push(EndpointBucketStats {
                endpoint: endpoint.to_string(),
                tokens_remaining: tokens.unwrap_or(self.config.capacity()),
                capacity: self.config.capacity(),
            });
        }
        Ok(stats)
    }
}

#[derive(Debug, Clone)]
pub struct EndpointBucketStats {
    pub endpoint: String,
    pub tokens_remaining: f64,
    pub capacity: f64,
}
