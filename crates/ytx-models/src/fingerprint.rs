//! Fingerprint canonicalisation: deriving `(video_id, language, clean_flag)`
//! from arbitrary user-supplied input.
//!
//! Untrusted input, domain allow-list, no shell execution, plain string
//! matching rather than a generic URL-template engine.

use std::fmt;

/// Errors that can occur while canonicalising a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    /// Host is not a recognised YouTube domain.
    UnrecognisedHost,
    /// No video id could be located in the input.
    IdNotFound,
    /// A candidate id was found but fails the 11-char/charset check.
    InvalidVideoId(String),
    /// The language subtag was empty after trimming.
    EmptyLanguage,
}

impl fmt::Display for FingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintError::UnrecognisedHost => write!(f, "host is not a recognised YouTube domain"),
            FingerprintError::IdNotFound => write!(f, "no video id found in input"),
            FingerprintError::InvalidVideoId(id) => write!(f, "invalid video id: {id}"),
            FingerprintError::EmptyLanguage => write!(f, "language code is empty"),
        }
    }
}

impl std::error::Error for FingerprintError {}

pub type FingerprintResult<T> = Result<T, FingerprintError>;

const RECOGNISED_HOSTS: [&str; 3] = ["youtube.com", "youtu.be", "youtube-nocookie.com"];

/// The sole cache key of the system: `(video_id, language, clean_flag)`.
///
/// Equal fingerprints compare equal byte-for-byte in their encoded form
/// (see [`Fingerprint::encode`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint {
    pub video_id: String,
    pub language: String,
    pub clean_flag: bool,
}

impl Fingerprint {
    /// Canonicalise a bare id or URL plus a raw language tag into a
    /// [`Fingerprint`]. `clean_flag` defaults to `true` when `None`.
    pub fn canonicalise(
        video_ref: &str,
        language: Option<&str>,
        clean_flag: Option<bool>,
    ) -> FingerprintResult<Self> {
        let video_id = extract_video_id(video_ref)?;
        let language = canonicalise_language(language.unwrap_or("en"))?;
        Ok(Self {
            video_id,
            language,
            clean_flag: clean_flag.unwrap_or(true),
        })
    }

    /// Stable string encoding used to derive tier keys (`artifact:<F>`,
    /// `lock:<F>`, `job:index:<F>`).
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.video_id, self.language, self.clean_flag)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Lower-cases a language tag except for a trailing script subtag
/// (e.g. `zh-Hans` keeps `Hans` capitalised as written).
fn canonicalise_language(raw: &str) -> FingerprintResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FingerprintError::EmptyLanguage);
    }
    match raw.split_once('-') {
        Some((primary, script)) => Ok(format!("{}-{}", primary.to_ascii_lowercase(), script)),
        None => Ok(raw.to_ascii_lowercase()),
    }
}

/// Extract and validate an 11-character video id from a bare id or a
/// recognised-host URL.
pub fn extract_video_id(video_ref: &str) -> FingerprintResult<String> {
    let video_ref = video_ref.trim();

    if is_bare_candidate_id(video_ref) {
        return validate_video_id(video_ref.to_string());
    }

    if !is_recognised_host(video_ref) {
        return Err(FingerprintError::UnrecognisedHost);
    }

    extract_from_watch(video_ref)
        .or_else(|| extract_from_short(video_ref))
        .or_else(|| extract_from_embed(video_ref))
        .or_else(|| extract_from_v(video_ref))
        .or_else(|| extract_from_shorts(video_ref))
        .ok_or(FingerprintError::IdNotFound)
        .and_then(validate_video_id)
}

fn is_bare_candidate_id(s: &str) -> bool {
    s.len() == 11 && !s.contains("://") && !s.contains('.') && !s.contains('/')
}

fn is_recognised_host(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    RECOGNISED_HOSTS.iter().any(|h| lower.contains(h))
}

fn extract_from_watch(url: &str) -> Option<String> {
    url.find("?v=")
        .map(|p| p + 3)
        .or_else(|| url.find("&v=").map(|p| p + 3))
        .and_then(|start| extract_id_from_segment(&url[start..]))
}

fn extract_from_short(url: &str) -> Option<String> {
    let start = url.find("youtu.be/")? + 9;
    extract_id_from_segment(url.get(start..)?)
}

fn extract_from_embed(url: &str) -> Option<String> {
    let start = url.find("/embed/")? + 7;
    extract_id_from_segment(url.get(start..)?)
}

fn extract_from_v(url: &str) -> Option<String> {
    let start = url.find("/v/")? + 3;
    extract_id_from_segment(url.get(start..)?)
}

fn extract_from_shorts(url: &str) -> Option<String> {
    let start = url.find("/shorts/")? + 8;
    extract_id_from_segment(url.get(start..)?)
}

fn extract_id_from_segment(segment: &str) -> Option<String> {
    let delimiters = ['&', '#', '?', '/'];
    let end = segment.find(|c| delimiters.contains(&c)).unwrap_or(segment.len());
    let candidate = segment[..end].trim();
    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

fn is_valid_id_chars(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate_video_id(id: String) -> FingerprintResult<String> {
    if id.len() == 11 && is_valid_id_chars(&id) {
        Ok(id)
    } else {
        Err(FingerprintError::InvalidVideoId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalise_watch_url() {
        let f = Fingerprint::canonicalise("https://www.youtube.com/watch?v=dQw4w9WgXcQ", None, None).unwrap();
        assert_eq!(f.video_id, "dQw4w9WgXcQ");
        assert_eq!(f.language, "en");
        assert!(f.clean_flag);
    }

    #[test]
    fn canonicalise_bare_id() {
        let f = Fingerprint::canonicalise("dQw4w9WgXcQ", Some("EN"), Some(false)).unwrap();
        assert_eq!(f.video_id, "dQw4w9WgXcQ");
        assert_eq!(f.language, "en");
        assert!(!f.clean_flag);
    }

    #[test]
    fn all_recognised_path_shapes() {
        for (url, expected) in [
            ("https://youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtu.be/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtube.com/embed/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtube.com/v/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtube.com/shorts/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
        ] {
            let f = Fingerprint::canonicalise(url, None, None).unwrap();
            assert_eq!(f.video_id, expected, "failed for {url}");
        }
    }

    #[test]
    fn rejects_unrecognised_host() {
        let err = Fingerprint::canonicalise("https://vimeo.com/123456789", None, None).unwrap_err();
        assert_eq!(err, FingerprintError::UnrecognisedHost);
    }

    #[test]
    fn rejects_short_id() {
        let err = Fingerprint::canonicalise("https://youtube.com/watch?v=abc123", None, None).unwrap_err();
        assert!(matches!(err, FingerprintError::InvalidVideoId(_)));
    }

    #[test]
    fn script_subtag_preserved() {
        let f = Fingerprint::canonicalise("dQw4w9WgXcQ", Some("ZH-Hans"), None).unwrap();
        assert_eq!(f.language, "zh-Hans");
    }

    #[test]
    fn determinism_equal_fingerprints_encode_identically() {
        let a = Fingerprint::canonicalise("https://youtu.be/dQw4w9WgXcQ", Some("en"), Some(true)).unwrap();
        let b = Fingerprint::canonicalise("dQw4w9WgXcQ", Some("EN"), Some(true)).unwrap();
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn empty_language_rejected() {
        let err = Fingerprint::canonicalise("dQw4w9WgXcQ", Some("   "), None).unwrap_err();
        assert_eq!(err, FingerprintError::EmptyLanguage);
    }
}
