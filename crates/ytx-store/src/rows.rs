//! `sqlx::FromRow` row types mapping the `artifact` and `job` tables onto the
//! shared model types.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use ytx_models::{Artifact, Engine, ErrorKind, Fingerprint, JobRecord, JobStatus, Segment, WebhookDeliveryStatus};

#[derive(Debug, sqlx::FromRow)]
pub struct ArtifactRow {
    pub video_id: String,
    pub language: String,
    pub clean_flag: bool,
    pub title: Option<String>,
    pub segments: Json<Vec<Segment>>,
    pub plain_text: Option<String>,
    pub engine_used: String,
    pub integrity: String,
    pub extraction_duration_ms: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ArtifactRow {
    pub fn into_artifact(self) -> Artifact {
        Artifact {
            fingerprint: Fingerprint {
                video_id: self.video_id,
                language: self.language,
                clean_flag: self.clean_flag,
            },
            title: self.title,
            engine_used: if self.engine_used == "fallback" { Engine::Fallback } else { Engine::Primary },
            segments: self.segments.0,
            plain_text: self.plain_text,
            extraction_duration_ms: self.extraction_duration_ms as u64,
            created_at: self.created_at,
            expires_at: self.expires_at,
            integrity: self.integrity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JobRow {
    pub job_id: String,
    pub video_id: String,
    pub language: String,
    pub clean_flag: bool,
    pub status: String,
    pub error_kind: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub webhook_url: Option<String>,
    pub webhook_delivery_status: String,
    pub attempts: i32,
}

impl JobRow {
    pub fn into_job_record(self) -> JobRecord {
        JobRecord {
            job_id: self.job_id.into(),
            fingerprint: Fingerprint {
                video_id: self.video_id,
                language: self.language,
                clean_flag: self.clean_flag,
            },
            status: parse_job_status(&self.status),
            enqueued_at: self.enqueued_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
            error_kind: self.error_kind.as_deref().map(parse_error_kind),
            webhook_url: self.webhook_url,
            webhook_delivery_status: parse_delivery_status(&self.webhook_delivery_status),
            attempts: self.attempts as u32,
        }
    }
}

fn parse_job_status(s: &str) -> JobStatus {
    match s {
        "running" => JobStatus::Running,
        "finished" => JobStatus::Finished,
        "failed" => JobStatus::Failed,
        _ => JobStatus::Queued,
    }
}

pub fn job_status_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Queued => "queued",
        JobStatus::Running => "running",
        JobStatus::Finished => "finished",
        JobStatus::Failed => "failed",
    }
}

fn parse_delivery_status(s: &str) -> WebhookDeliveryStatus {
    match s {
        "pending" => WebhookDeliveryStatus::Pending,
        "delivered" => WebhookDeliveryStatus::Delivered,
        "failed" => WebhookDeliveryStatus::Failed,
        _ => WebhookDeliveryStatus::None,
    }
}

pub fn delivery_status_str(status: WebhookDeliveryStatus) -> &'static str {
    match status {
        WebhookDeliveryStatus::None => "none",
        WebhookDeliveryStatus::Pending => "pending",
        WebhookDeliveryStatus::Delivered => "delivered",
        WebhookDeliveryStatus::Failed => "failed",
    }
}

fn parse_error_kind(s: &str) -> ErrorKind {
    match s {
        "invalid_input" => ErrorKind::InvalidInput,
        "rate_limited" => ErrorKind::RateLimited,
        "video_unavailable" => ErrorKind::VideoUnavailable,
        "subtitles_disabled" => ErrorKind::SubtitlesDisabled,
        "language_unavailable" => ErrorKind::LanguageUnavailable,
        "upstream_blocked" => ErrorKind::UpstreamBlocked,
        "upstream_transient" => ErrorKind::UpstreamTransient,
        "dependency_down" => ErrorKind::DependencyDown,
        _ => ErrorKind::Internal,
    }
}
