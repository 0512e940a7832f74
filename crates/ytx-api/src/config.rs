//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Per-IP ambient throttle (defense-in-depth, distinct from C6).
    pub ip_rate_limit_rps: u32,
    pub ip_rate_limit_burst: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// `extraction_timeout + margin` used to size the single-flight lock TTL.
    pub extraction_timeout_seconds: u64,
    pub lock_margin_seconds: u64,
    /// Max items accepted by `submit_batch` (§6).
    pub batch_max_items: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            ip_rate_limit_rps: 10,
            ip_rate_limit_burst: 20,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            extraction_timeout_seconds: 30,
            lock_margin_seconds: 15,
            batch_max_items: 100,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(default.host),
            port: std::env::var("API_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(default.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.cors_origins),
            ip_rate_limit_rps: std::env::var("IP_RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.ip_rate_limit_rps),
            ip_rate_limit_burst: std::env::var("IP_RATE_LIMIT_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.ip_rate_limit_burst),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT").ok().and_then(|s| s.parse().ok()).unwrap_or(30),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(default.environment),
            extraction_timeout_seconds: std::env::var("EXTRACTION_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.extraction_timeout_seconds),
            lock_margin_seconds: std::env::var("LOCK_MARGIN_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.lock_margin_seconds),
            batch_max_items: std::env::var("BATCH_MAX_ITEMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.batch_max_items),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    pub fn lock_ttl_seconds(&self) -> u64 {
        self.extraction_timeout_seconds + self.lock_margin_seconds
    }
}
