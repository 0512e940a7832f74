//! API error types (§7): one `thiserror` enum for the admission/HTTP
//! boundary, with a `kind()` mapping onto the shared closed taxonomy and an
//! `IntoResponse` impl that redacts internals in production.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use ytx_models::ErrorKind;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("rate limited")]
    RateLimited { retry_after_seconds: f64, reset_at_unix_ms: i64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("cache error: {0}")]
    Cache(#[from] ytx_cache::CacheError),

    #[error("store error: {0}")]
    Store(#[from] ytx_store::StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] ytx_queue::QueueError),

    #[error("invalid fingerprint: {0}")]
    Fingerprint(#[from] ytx_models::FingerprintError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// Maps onto the shared closed taxonomy (§7), mirroring every other
    /// crate's `kind()` method so callers classify failures identically.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidInput(_) | ApiError::Fingerprint(_) => ErrorKind::InvalidInput,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::NotFound(_) | ApiError::BadRequest(_) | ApiError::Validation(_) => ErrorKind::InvalidInput,
            ApiError::ServiceUnavailable(_) => ErrorKind::DependencyDown,
            ApiError::Internal(_) => ErrorKind::Internal,
            ApiError::Cache(e) => e.kind(),
            ApiError::Store(e) => e.kind(),
            ApiError::Queue(e) => e.kind(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::Fingerprint(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) | ApiError::Cache(_) | ApiError::Store(_) | ApiError::Queue(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.kind().as_str();

        // Don't expose internal error details in production.
        let detail = match &self {
            ApiError::Internal(_) | ApiError::Cache(_) | ApiError::Store(_) | ApiError::Queue(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "an internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse { detail, code };
        let mut response = (status, Json(body)).into_response();

        if let ApiError::RateLimited { retry_after_seconds, reset_at_unix_ms } = self {
            let headers = response.headers_mut();
            if let Ok(v) = HeaderValue::from_str(&retry_after_seconds.ceil().to_string()) {
                headers.insert(HeaderName::from_static("retry-after"), v.clone());
                headers.insert(HeaderName::from_static("x-ratelimit-retry-after"), v);
            }
            if let Ok(v) = HeaderValue::from_str(&reset_at_unix_ms.to_string()) {
                headers.insert(HeaderName::from_static("x-ratelimit-reset"), v);
            }
        }

        response
    }
}
