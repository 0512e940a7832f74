//! The two extraction engines. Follows this codebase's existing
//! transcript-fetch module: a fast structured primary call, and a fallback
//! that hits a different upstream endpoint and parses a caption-file format
//! (VTT-like cue blocks) rather than structured JSON.

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};
use ytx_models::Segment;

use crate::error::{ExtractorError, ExtractorResult};
use crate::proxy::ProxyDescriptor;

pub struct RawTranscript {
    pub title: Option<String>,
    pub segments: Vec<Segment>,
}

fn build_client(proxy: Option<&ProxyDescriptor>, timeout: Duration) -> ExtractorResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(p) = proxy {
        let mut proxy = reqwest::Proxy::all(&p.endpoint).map_err(ExtractorError::Http)?;
        if let (Some(user), Some(pass)) = (&p.username, &p.password) {
            proxy = proxy.basic_auth(user, pass);
        }
        builder = builder.proxy(proxy);
    }
    builder.build().map_err(ExtractorError::Http)
}

fn classify_status(status: reqwest::StatusCode) -> ExtractorError {
    match status.as_u16() {
        403 | 429 => ExtractorError::UpstreamBlocked,
        404 => ExtractorError::VideoUnavailable,
        _ => ExtractorError::UpstreamTransient(format!("status {status}")),
    }
}

#[derive(Debug, Deserialize)]
struct PrimaryCaptionResponse {
    title: Option<String>,
    events: Vec<PrimaryCaptionEvent>,
}

#[derive(Debug, Deserialize)]
struct PrimaryCaptionEvent {
    #[serde(rename = "tStartMs")]
    t_start_ms: f64,
    #[serde(rename = "dDurationMs")]
    d_duration_ms: f64,
    segs: Vec<PrimarySegmentText>,
}

#[derive(Debug, Deserialize)]
struct PrimarySegmentText {
    utf8: String,
}

/// The primary engine: a structured JSON captions endpoint.
pub struct PrimaryEngine {
    pub base_url: String,
}

impl Default for PrimaryEngine {
    fn default() -> Self {
        Self { base_url: "https://www.youtube.com/api/timedtext".to_string() }
    }
}

impl PrimaryEngine {
    pub async fn fetch(
        &self,
        video_id: &str,
        language: &str,
        proxy: Option<&ProxyDescriptor>,
        timeout: Duration,
    ) -> ExtractorResult<RawTranscript> {
        let client = build_client(proxy, timeout)?;
        let url = format!("{}?v={video_id}&lang={language}&fmt=json3", self.base_url);

        debug!(video_id, language, proxy = proxy.map(|p| p.endpoint.as_str()), "primary engine request");

        let response = client.get(&url).send().await.map_err(ExtractorError::Http)?;
        if !response.status().is_success() {
            return Err(classify_status(response.status()));
        }

        let body = response.text().await.map_err(ExtractorError::Http)?;
        if body.trim().is_empty() {
            return Err(ExtractorError::SubtitlesDisabled);
        }

        let parsed: PrimaryCaptionResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractorError::UpstreamTransient(format!("malformed primary response: {e}")))?;

        if parsed.events.is_empty() {
            return Err(ExtractorError::LanguageUnavailable);
        }

        let segments = parsed
            .events
            .into_iter()
            .map(|e| Segment {
                text: e.segs.into_iter().map(|s| s.utf8).collect::<String>(),
                start_seconds: e.t_start_ms / 1000.0,
                duration_seconds: e.d_duration_ms / 1000.0,
            })
            .filter(|s| !s.text.trim().is_empty())
            .collect();

        Ok(RawTranscript { title: parsed.title, segments })
    }
}

/// The fallback engine: a different upstream endpoint serving a VTT-like
/// caption file, parsed by hand rather than structured JSON decoding.
pub struct FallbackEngine {
    pub base_url: String,
}

impl Default for FallbackEngine {
    fn default() -> Self {
        Self { base_url: "https://www.youtube.com/api/timedtext".to_string() }
    }
}

impl FallbackEngine {
    pub async fn fetch(
        &self,
        video_id: &str,
        language: &str,
        proxy: Option<&ProxyDescriptor>,
        timeout: Duration,
    ) -> ExtractorResult<RawTranscript> {
        let client = build_client(proxy, timeout)?;
        let url = format!("{}?v={video_id}&lang={language}&fmt=vtt", self.base_url);

        debug!(video_id, language, proxy = proxy.map(|p| p.endpoint.as_str()), "fallback engine request");

        let response = client.get(&url).send().await.map_err(ExtractorError::Http)?;
        if !response.status().is_success() {
            return Err(classify_status(response.status()));
        }

        let body = response.text().await.map_err(ExtractorError::Http)?;
        if body.trim().is_empty() {
            return Err(ExtractorError::SubtitlesDisabled);
        }

        let segments = parse_vtt(&body);
        if segments.is_empty() {
            warn!(video_id, "fallback engine produced no segments");
            return Err(ExtractorError::LanguageUnavailable);
        }

        Ok(RawTranscript { title: None, segments })
    }
}

/// Parse a WebVTT cue stream into ordered segments.
fn parse_vtt(content: &str) -> Vec<Segment> {
    let cue_pattern =
        Regex::new(r"(\d{2}:\d{2}:\d{2}\.\d{3}) --> (\d{2}:\d{2}:\d{2}\.\d{3})").expect("valid regex");
    let tag_pattern = Regex::new(r"<[^>]+>").expect("valid regex");

    let mut segments = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(caps) = cue_pattern.captures(line) else { continue };
        let start = parse_vtt_timestamp(&caps[1]);
        let end = parse_vtt_timestamp(&caps[2]);

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() || cue_pattern.is_match(next) {
                break;
            }
            text_lines.push(tag_pattern.replace_all(lines.next().unwrap(), "").trim().to_string());
        }
        let text = text_lines.join(" ").trim().to_string();
        if !text.is_empty() {
            segments.push(Segment { text, start_seconds: start, duration_seconds: (end - start).max(0.0) });
        }
    }

    segments
}

fn parse_vtt_timestamp(raw: &str) -> f64 {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 3 {
        return 0.0;
    }
    let hours: f64 = parts[0].parse().unwrap_or(0.0);
    let minutes: f64 = parts[1].parse().unwrap_or(0.0);
    let seconds: f64 = parts[2].parse().unwrap_or(0.0);
    hours * 3600.0 + minutes * 60.0 + seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_vtt_cues() {
        let vtt = "WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nhello <c>world</c>\n\n00:00:03.000 --> 00:00:04.000\ngoodbye\n";
        let segments = parse_vtt(vtt);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello world");
        assert!((segments[0].start_seconds - 1.0).abs() < 1e-9);
        assert!((segments[0].duration_seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn empty_vtt_yields_no_segments() {
        assert!(parse_vtt("WEBVTT\n").is_empty());
    }
}
