//! The webhook JSON body (§4.10): `event, job_id, fingerprint, status,
//! result|error, timestamp`.

use serde::Serialize;
use ytx_models::{Artifact, ErrorKind, JobRecord, JobStatus};

#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub title: Option<String>,
    pub engine_used: &'static str,
    pub segment_count: usize,
    pub plain_text: Option<String>,
    pub integrity: String,
}

impl From<&Artifact> for ResultSummary {
    fn from(artifact: &Artifact) -> Self {
        Self {
            title: artifact.title.clone(),
            engine_used: artifact.engine_used.as_str(),
            segment_count: artifact.segments.len(),
            plain_text: artifact.plain_text.clone(),
            integrity: artifact.integrity.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub event: &'static str,
    pub job_id: String,
    pub fingerprint: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorSummary>,
    pub timestamp: String,
}

impl WebhookPayload {
    /// Build the payload for a terminal job. `artifact` is only consulted
    /// when `job.status == Finished`.
    pub fn for_job(job: &JobRecord, artifact: Option<&Artifact>) -> Self {
        let status = match job.status {
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
            JobStatus::Queued | JobStatus::Running => "running",
        };
        Self {
            event: "extraction.completed",
            job_id: job.job_id.as_str().to_string(),
            fingerprint: job.fingerprint.encode(),
            status,
            result: artifact.map(ResultSummary::from),
            error: job.error_kind.map(|kind| ErrorSummary { kind }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ytx_models::{Engine, Fingerprint, Segment};

    fn fp() -> Fingerprint {
        Fingerprint::canonicalise("dQw4w9WgXcQ", None, None).unwrap()
    }

    #[test]
    fn finished_job_carries_result_not_error() {
        let mut job = JobRecord::new(fp(), None);
        job.mark_running();
        job.mark_finished();
        let artifact = Artifact::new(
            fp(),
            Some("title".into()),
            Engine::Primary,
            vec![Segment { text: "hi".into(), start_seconds: 0.0, duration_seconds: 1.0 }],
            120,
            chrono::Duration::seconds(3600),
        );
        let payload = WebhookPayload::for_job(&job, Some(&artifact));
        assert_eq!(payload.status, "finished");
        assert!(payload.result.is_some());
        assert!(payload.error.is_none());
    }

    #[test]
    fn failed_job_carries_error_not_result() {
        let mut job = JobRecord::new(fp(), None);
        job.mark_running();
        job.mark_failed(ErrorKind::UpstreamBlocked);
        let payload = WebhookPayload::for_job(&job, None);
        assert_eq!(payload.status, "failed");
        assert!(payload.result.is_none());
        assert!(payload.error.is_some());
    }
}
