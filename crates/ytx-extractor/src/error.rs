//! Extractor error types.

use thiserror::Error;
use ytx_models::ErrorKind;

pub type ExtractorResult<T> = Result<T, ExtractorError>;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("video unavailable")]
    VideoUnavailable,

    #[error("subtitles disabled")]
    SubtitlesDisabled,

    #[error("language unavailable")]
    LanguageUnavailable,

    #[error("upstream blocked after full ladder")]
    UpstreamBlocked,

    #[error("upstream transient failure: {0}")]
    UpstreamTransient(String),

    #[error("no proxy available")]
    NoProxyAvailable,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ExtractorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractorError::VideoUnavailable => ErrorKind::VideoUnavailable,
            ExtractorError::SubtitlesDisabled => ErrorKind::SubtitlesDisabled,
            ExtractorError::LanguageUnavailable => ErrorKind::LanguageUnavailable,
            ExtractorError::UpstreamBlocked => ErrorKind::UpstreamBlocked,
            ExtractorError::UpstreamTransient(_) => ErrorKind::UpstreamTransient,
            ExtractorError::NoProxyAvailable => ErrorKind::UpstreamTransient,
            ExtractorError::Http(_) => ErrorKind::UpstreamTransient,
            ExtractorError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Non-retryable outcomes that short-circuit the attempt ladder (§4.8).
    pub fn is_permanent(&self) -> bool {
        self.kind().is_permanent_failure()
    }
}
