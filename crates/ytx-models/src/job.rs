//! Job record: lifecycle state for a single extraction request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error_kind::ErrorKind;
use crate::fingerprint::Fingerprint;

/// Opaque unique job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// `queued → running → {finished, failed}`, monotonic, no reverse edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }

    /// Whether `next` is a legal successor of `self` under the monotonic
    /// state machine (invariant 4). Equality is not itself a transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Finished)
                | (JobStatus::Running, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Queued) // reaper reset on expired lease
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookDeliveryStatus {
    None,
    Pending,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub fingerprint: Fingerprint,
    pub status: JobStatus,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error_kind: Option<ErrorKind>,
    pub webhook_url: Option<String>,
    pub webhook_delivery_status: WebhookDeliveryStatus,
    pub attempts: u32,
}

impl JobRecord {
    pub fn new(fingerprint: Fingerprint, webhook_url: Option<String>) -> Self {
        Self {
            job_id: JobId::new(),
            fingerprint,
            status: JobStatus::Queued,
            enqueued_at: Utc::now(),
            started_at: None,
            ended_at: None,
            error_kind: None,
            webhook_url,
            webhook_delivery_status: WebhookDeliveryStatus::None,
            attempts: 0,
        }
    }

    pub fn mark_running(&mut self) {
        debug_assert!(self.status.can_transition_to(JobStatus::Running));
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_finished(&mut self) {
        debug_assert!(self.status.can_transition_to(JobStatus::Finished));
        self.status = JobStatus::Finished;
        self.ended_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, kind: ErrorKind) {
        debug_assert!(self.status.can_transition_to(JobStatus::Failed));
        self.status = JobStatus::Failed;
        self.error_kind = Some(kind);
        self.ended_at = Some(Utc::now());
    }

    /// Crash-recovery reset: a `running` job whose lease expired goes back
    /// to `queued` for redelivery (§4.7).
    pub fn reset_to_queued(&mut self) {
        debug_assert!(self.status.can_transition_to(JobStatus::Queued));
        self.status = JobStatus::Queued;
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;

    fn fp() -> Fingerprint {
        Fingerprint::canonicalise("dQw4w9WgXcQ", None, None).unwrap()
    }

    #[test]
    fn lifecycle_is_monotonic() {
        let mut job = JobRecord::new(fp(), None);
        assert_eq!(job.status, JobStatus::Queued);
        job.mark_running();
        assert_eq!(job.status, JobStatus::Running);
        job.mark_finished();
        assert_eq!(job.status, JobStatus::Finished);
        assert!(job.status.is_terminal());
    }

    #[test]
    fn reaper_resets_running_to_queued() {
        let mut job = JobRecord::new(fp(), None);
        job.mark_running();
        job.reset_to_queued();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.started_at.is_none());
    }
}
