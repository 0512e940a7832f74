//! Webhook dispatcher configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    /// HMAC signing secret. Required before any dispatch is attempted.
    pub secret: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10), max_retries: 3, secret: String::new() }
    }
}

impl WebhookConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            timeout: Duration::from_secs(
                std::env::var("WEBHOOK_TIMEOUT").ok().and_then(|s| s.parse().ok()).unwrap_or(10),
            ),
            max_retries: std::env::var("WEBHOOK_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
            secret: std::env::var("WEBHOOK_SECRET").unwrap_or_default(),
        }
    }
}
