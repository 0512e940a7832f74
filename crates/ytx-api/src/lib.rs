//! Axum HTTP API server: the admission orchestrator (C11) and thin HTTP
//! binding (C12) for the ytx transcript extraction backend.
//!
//! This crate provides:
//! - `submit`/`lookup_cached`/`submit_batch`/`job_status` ingress ops
//! - The C5 cache coordinator and C6 rate limiter
//! - Admin ops: `clear_cache`, `queue_stats`, `rate_limit_stats`, `rate_limit_reset`
//! - Prometheus metrics, security headers, CORS, request logging

pub mod config;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod rate_limiter;
pub mod retention;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use coordinator::Coordinator;
pub use error::{ApiError, ApiResult};
pub use rate_limiter::RateLimiter;
pub use retention::RetentionSweeper;
pub use routes::create_router;
pub use state::AppState;
