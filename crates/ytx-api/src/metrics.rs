//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new().install_recorder().expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "ytx_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "ytx_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "ytx_http_requests_in_flight";

    // Admission metrics (C11)
    pub const ADMISSION_OUTCOMES_TOTAL: &str = "ytx_admission_outcomes_total";

    // Rate limiting metrics (C6 + ambient per-IP throttle)
    pub const RATE_LIMIT_HITS_TOTAL: &str = "ytx_rate_limit_hits_total";
    pub const RATE_LIMIT_DENIALS_TOTAL: &str = "ytx_rate_limit_denials_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [("method", method.to_string()), ("path", sanitize_path(path)), ("status", status.to_string())];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a `submit`/`submit_batch` admission outcome (ready, queued_leader,
/// queued_follower).
pub fn record_admission(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::ADMISSION_OUTCOMES_TOTAL, &labels).increment(1);
}

/// Record a C6 rate-limit denial for `(principal, endpoint)`.
pub fn record_rate_limit_denial(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_DENIALS_TOTAL, &labels).increment(1);
}

/// Record the ambient per-IP throttle tripping.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap())
}

fn numeric_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/[0-9]+(/|$)").unwrap())
}

fn job_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/jobs/[a-zA-Z0-9_-]+").unwrap())
}

/// Sanitize path for metrics labels (replace job ids/UUIDs with
/// placeholders so cardinality stays bounded).
fn sanitize_path(path: &str) -> String {
    let path = job_segment_regex().replace_all(path, "/jobs/:job_id");
    let path = id_regex().replace_all(&path, ":id");
    let path = numeric_segment_regex().replace_all(&path, "/:id$1");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();
    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/api/jobs/550e8400-e29b-41d4-a716-446655440000"), "/api/jobs/:job_id");
        assert_eq!(sanitize_path("/api/admin/rate_limit/42"), "/api/admin/rate_limit/:id");
    }
}
