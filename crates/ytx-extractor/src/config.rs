//! Extractor configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Bounded wall-clock budget per extraction call (§4.8, default 30s).
    pub extraction_timeout: Duration,
    /// Max attempts across the whole ladder (primary/fallback x direct/proxy).
    pub extraction_max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    /// Path to a JSON file describing the proxy pool at startup.
    pub proxy_pool_path: Option<String>,
    pub proxy_max_failures: u32,
    pub proxy_cooldown_seconds: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            extraction_timeout: Duration::from_secs(30),
            extraction_max_attempts: 4,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(8),
            proxy_pool_path: None,
            proxy_max_failures: 3,
            proxy_cooldown_seconds: 60,
        }
    }
}

impl ExtractorConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            extraction_timeout: Duration::from_secs(
                std::env::var("EXTRACTION_TIMEOUT").ok().and_then(|s| s.parse().ok()).unwrap_or(30),
            ),
            extraction_max_attempts: std::env::var("EXTRACTION_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.extraction_max_attempts),
            backoff_base: Duration::from_secs(
                std::env::var("BACKOFF_BASE_SECONDS").ok().and_then(|s| s.parse().ok()).unwrap_or(1),
            ),
            backoff_cap: Duration::from_secs(
                std::env::var("BACKOFF_CAP_SECONDS").ok().and_then(|s| s.parse().ok()).unwrap_or(8),
            ),
            proxy_pool_path: std::env::var("PROXY_POOL_PATH").ok(),
            proxy_max_failures: std::env::var("PROXY_MAX_FAILURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.proxy_max_failures),
            proxy_cooldown_seconds: std::env::var("PROXY_COOLDOWN_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.proxy_cooldown_seconds),
        }
    }
}
