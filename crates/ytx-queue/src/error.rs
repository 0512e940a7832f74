//! Queue error types.

use thiserror::Error;
use ytx_models::ErrorKind;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("cache backend error: {0}")]
    Cache(#[from] ytx_cache::CacheError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] ytx_store::StoreError),
}

impl QueueError {
    pub fn job_not_found(job_id: impl Into<String>) -> Self {
        Self::JobNotFound(job_id.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::JobNotFound(_) => ErrorKind::Internal,
            QueueError::Cache(_) => ErrorKind::DependencyDown,
            QueueError::Json(_) => ErrorKind::Internal,
            QueueError::Store(e) => e.kind(),
        }
    }
}
