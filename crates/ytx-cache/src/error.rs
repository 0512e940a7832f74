//! Cache error types.

use thiserror::Error;
use ytx_models::ErrorKind;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cas conflict on key: {0}")]
    CasConflict(String),
}

impl CacheError {
    pub fn cas_conflict(key: impl Into<String>) -> Self {
        Self::CasConflict(key.into())
    }

    /// Maps onto the shared closed taxonomy (§7): a cache outage is always
    /// `DependencyDown`, never a client-facing error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::Redis(_) => ErrorKind::DependencyDown,
            CacheError::Json(_) => ErrorKind::Internal,
            CacheError::CasConflict(_) => ErrorKind::Internal,
        }
    }
}
