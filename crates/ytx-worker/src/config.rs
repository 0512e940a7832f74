//! Worker configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum number of extraction jobs processed concurrently.
    pub max_concurrent_jobs: usize,
    /// Graceful shutdown grace period before in-flight jobs are abandoned.
    pub shutdown_timeout: Duration,
    /// How often the reaper scans for jobs with an expired lease.
    pub reap_interval: Duration,
    /// How many webhook dispatch tasks may run concurrently without
    /// blocking the main consume loop (§4.9: bounded hand-off).
    pub webhook_dispatch_concurrency: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 8,
            shutdown_timeout: Duration::from_secs(30),
            reap_interval: Duration::from_secs(30),
            webhook_dispatch_concurrency: 16,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_CONCURRENT_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_concurrent_jobs),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            reap_interval: Duration::from_secs(
                std::env::var("WORKER_REAP_INTERVAL_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(30),
            ),
            webhook_dispatch_concurrency: std::env::var("WORKER_WEBHOOK_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.webhook_dispatch_concurrency),
        }
    }
}
