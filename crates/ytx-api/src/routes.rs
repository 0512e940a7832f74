//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::admin::{clear_cache, queue_stats, rate_limit_reset, rate_limit_stats};
use crate::handlers::health::{health, ready};
use crate::handlers::jobs::{job_status, lookup_cached, submit, submit_batch};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let ingress_routes = Router::new()
        .route("/submit", post(submit))
        .route("/lookup", post(lookup_cached))
        .route("/submit_batch", post(submit_batch))
        .route("/jobs/:job_id", get(job_status));

    let admin_routes = Router::new()
        .route("/admin/cache/clear", post(clear_cache))
        .route("/admin/queue/stats", get(queue_stats))
        .route("/admin/rate_limit/:principal", get(rate_limit_stats))
        .route("/admin/rate_limit/:principal/reset", post(rate_limit_reset));

    // Ambient per-IP throttle, defense-in-depth on top of the C6 contract
    // enforced inside each handler.
    let ip_rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.ip_rate_limit_rps));

    let api_routes = Router::new()
        .merge(ingress_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(ip_rate_limiter.clone(), rate_limit_middleware));

    let health_routes = Router::new().route("/health", get(health)).route("/healthz", get(health)).route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
