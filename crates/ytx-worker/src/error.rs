//! Worker error types.

use thiserror::Error;
use ytx_models::ErrorKind;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("queue error: {0}")]
    Queue(#[from] ytx_queue::QueueError),

    #[error("store error: {0}")]
    Store(#[from] ytx_store::StoreError),

    #[error("cache error: {0}")]
    Cache(#[from] ytx_cache::CacheError),

    #[error("extractor error: {0}")]
    Extractor(#[from] ytx_extractor::ExtractorError),

    #[error("webhook error: {0}")]
    Webhook(#[from] ytx_webhook::WebhookError),

    #[error("commit error: {0}")]
    Commit(#[from] crate::commit::CommitError),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkerError::JobFailed(_) => ErrorKind::Internal,
            WorkerError::Queue(e) => e.kind(),
            WorkerError::Store(e) => e.kind(),
            WorkerError::Cache(e) => e.kind(),
            WorkerError::Extractor(e) => e.kind(),
            WorkerError::Webhook(e) => e.kind(),
            WorkerError::Commit(crate::commit::CommitError::Store(e)) => e.kind(),
            WorkerError::Commit(crate::commit::CommitError::Cache(e)) => e.kind(),
        }
    }
}
