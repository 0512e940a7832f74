//! Webhook dispatcher error types.

use thiserror::Error;
use ytx_models::ErrorKind;

pub type WebhookResult<T> = Result<T, WebhookError>;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid hmac key: {0}")]
    InvalidKey(String),

    #[error("non-2xx response: {0}")]
    NonSuccessStatus(u16),

    #[error("all {0} delivery attempts failed")]
    AllAttemptsFailed(u32),
}

impl WebhookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WebhookError::Http(_) => ErrorKind::UpstreamTransient,
            WebhookError::Json(_) => ErrorKind::Internal,
            WebhookError::InvalidKey(_) => ErrorKind::Internal,
            WebhookError::NonSuccessStatus(_) => ErrorKind::UpstreamTransient,
            WebhookError::AllAttemptsFailed(_) => ErrorKind::UpstreamTransient,
        }
    }
}
