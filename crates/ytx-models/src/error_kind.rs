//! The closed error taxonomy shared by every crate (§7). Each crate's
//! local `thiserror` enum maps its variants onto this one via a
//! `kind() -> ErrorKind` method instead of re-deriving the table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    RateLimited,
    VideoUnavailable,
    SubtitlesDisabled,
    LanguageUnavailable,
    UpstreamBlocked,
    UpstreamTransient,
    DependencyDown,
    Internal,
}

impl ErrorKind {
    /// Whether the core itself retries this kind (column 4 of the §7 table).
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::UpstreamTransient | ErrorKind::DependencyDown)
    }

    /// Terminal, non-retryable job outcomes that short-circuit the
    /// extractor's attempt ladder.
    pub fn is_permanent_failure(&self) -> bool {
        matches!(
            self,
            ErrorKind::VideoUnavailable | ErrorKind::SubtitlesDisabled | ErrorKind::LanguageUnavailable
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::VideoUnavailable => "video_unavailable",
            ErrorKind::SubtitlesDisabled => "subtitles_disabled",
            ErrorKind::LanguageUnavailable => "language_unavailable",
            ErrorKind::UpstreamBlocked => "upstream_blocked",
            ErrorKind::UpstreamTransient => "upstream_transient",
            ErrorKind::DependencyDown => "dependency_down",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(ErrorKind::UpstreamTransient.is_retryable());
        assert!(ErrorKind::DependencyDown.is_retryable());
        assert!(!ErrorKind::VideoUnavailable.is_retryable());
        assert!(!ErrorKind::InvalidInput.is_retryable());
    }

    #[test]
    fn permanent_failure_kinds() {
        assert!(ErrorKind::VideoUnavailable.is_permanent_failure());
        assert!(ErrorKind::SubtitlesDisabled.is_permanent_failure());
        assert!(ErrorKind::LanguageUnavailable.is_permanent_failure());
        assert!(!ErrorKind::UpstreamBlocked.is_permanent_failure());
    }
}
