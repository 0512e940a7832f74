//! The committed extraction result for a fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::fingerprint::Fingerprint;

/// A single subtitle line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Which extraction engine ultimately produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    Primary,
    Fallback,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Primary => "primary",
            Engine::Fallback => "fallback",
        }
    }
}

/// Immutable once `status=ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub fingerprint: Fingerprint,
    pub title: Option<String>,
    pub engine_used: Engine,
    pub segments: Vec<Segment>,
    pub plain_text: Option<String>,
    pub extraction_duration_ms: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub integrity: String,
}

impl Artifact {
    /// Build an artifact from extracted segments, computing `plain_text`
    /// (when `clean_flag=true`) and `integrity` as invariants 2 and 3
    /// require.
    pub fn new(
        fingerprint: Fingerprint,
        title: Option<String>,
        engine_used: Engine,
        segments: Vec<Segment>,
        extraction_duration_ms: u64,
        ttl: chrono::Duration,
    ) -> Self {
        let clean_flag = fingerprint.clean_flag;
        let plain_text = clean_flag.then(|| clean_segments(&segments));
        let integrity = compute_integrity(&segments);
        let created_at = Utc::now();
        Self {
            fingerprint,
            title,
            engine_used,
            segments,
            plain_text,
            extraction_duration_ms,
            created_at,
            expires_at: created_at + ttl,
            integrity,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Normalise and concatenate segment text into one plain-text blob.
///
/// Pure function of `segments`: collapses repeated whitespace, strips
/// bracketed cue tags (e.g. `[Music]`), and joins soft-broken lines with a
/// single space.
pub fn clean_segments(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return String::new();
    }
    let cleaned: Vec<String> = segments
        .iter()
        .map(|s| clean_text(&s.text))
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        // Segments existed but were entirely bracketed-tag content (e.g. all
        // "[Music]"); keep plain_text non-empty per invariant 3.
        return " ".to_string();
    }
    cleaned.join(" ")
}

fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_brackets = false;
    let mut last_was_space = true; // suppress leading whitespace
    for c in text.chars() {
        match c {
            '[' | '(' => in_brackets = true,
            ']' | ')' => in_brackets = false,
            _ if in_brackets => {}
            c if c.is_whitespace() => {
                if !last_was_space {
                    out.push(' ');
                    last_was_space = true;
                }
            }
            c => {
                out.push(c);
                last_was_space = false;
            }
        }
    }
    out.trim().to_string()
}

/// Content hash over segments, used for change detection (invariant 2).
pub fn compute_integrity(segments: &[Segment]) -> String {
    let mut hasher = Sha256::new();
    for seg in segments {
        hasher.update(seg.text.as_bytes());
        hasher.update(seg.start_seconds.to_bits().to_le_bytes());
        hasher.update(seg.duration_seconds.to_bits().to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, start: f64) -> Segment {
        Segment {
            text: text.to_string(),
            start_seconds: start,
            duration_seconds: 2.0,
        }
    }

    #[test]
    fn clean_segments_strips_brackets_and_collapses_whitespace() {
        let segments = vec![seg("[Music]   hello   world", 0.0), seg("(applause) goodbye", 2.0)];
        assert_eq!(clean_segments(&segments), "hello world goodbye");
    }

    #[test]
    fn clean_segments_of_empty_is_empty() {
        assert_eq!(clean_segments(&[]), "");
    }

    #[test]
    fn clean_segments_of_all_bracket_tags_is_nonempty() {
        let segments = vec![seg("[Music]", 0.0), seg("(applause)", 2.0)];
        let cleaned = clean_segments(&segments);
        assert!(!cleaned.is_empty());
    }

    #[test]
    fn integrity_is_deterministic() {
        let segments = vec![seg("hello", 0.0)];
        assert_eq!(compute_integrity(&segments), compute_integrity(&segments));
    }

    #[test]
    fn integrity_changes_with_content() {
        let a = vec![seg("hello", 0.0)];
        let b = vec![seg("goodbye", 0.0)];
        assert_ne!(compute_integrity(&a), compute_integrity(&b));
    }
}
