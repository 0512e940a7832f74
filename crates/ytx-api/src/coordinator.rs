//! Cache coordinator (C5): read-through lookup across C2->C3->C4 with
//! promotion on hit, single-flight reservation, and invalidation. The
//! write side of `commit(F, artifact | failure)` lives in
//! `ytx-worker::commit::Coordinator` — only the worker finishes
//! extractions, so the admission path only needs `lookup`/`reserve`/
//! `invalidate` (§4.5).

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use ytx_cache::{Tier1Cache, Tier2Cache};
use ytx_models::{Artifact, Fingerprint, JobId, JobRecord};
use ytx_queue::JobQueue;
use ytx_store::StoreClient;

use crate::error::{ApiError, ApiResult};

/// Bounded retries on reserve before yielding `ServiceUnavailable` (§4.5
/// step 3: "retry step 1 a bounded number of times").
const RESERVE_MAX_ATTEMPTS: u32 = 3;
const RESERVE_RETRY_BACKOFF: Duration = Duration::from_millis(50);

pub enum LookupOutcome {
    Ready(Artifact),
    Miss,
}

pub enum ReserveOutcome {
    Leader(JobId),
    Follower(JobId),
}

/// Scope of an `invalidate`/admin `clear_cache` call. `Durable` also
/// clears C2/C3 for the fingerprint so no tier contradicts C4's authority
/// (tier-coherence invariant); see DESIGN.md's Open Question 1 resolution
/// for why this does not touch in-flight jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Local,
    Shared,
    Durable,
}

pub struct Coordinator {
    tier1: Arc<Tier1Cache>,
    tier2: Tier2Cache,
    store: Arc<StoreClient>,
    queue: JobQueue,
    lock_ttl_seconds: u64,
}

impl Coordinator {
    pub fn new(
        tier1: Arc<Tier1Cache>,
        tier2: Tier2Cache,
        store: Arc<StoreClient>,
        queue: JobQueue,
        lock_ttl_seconds: u64,
    ) -> Self {
        Self { tier1, tier2, store, queue, lock_ttl_seconds }
    }

    /// `lookup(F) -> ready(artifact) | miss` (§4.5). Tries C2, then C3, then
    /// C4, promoting on each hit. A C4 hit past `expires_at` is treated as
    /// a miss and triggers refresh via the normal admission path.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> ApiResult<LookupOutcome> {
        if let Some(artifact) = self.tier1.get(fingerprint) {
            return Ok(LookupOutcome::Ready(artifact));
        }

        if let Some(artifact) = self.tier2.get_artifact(fingerprint).await? {
            self.tier1.put(fingerprint, artifact.clone(), None);
            return Ok(LookupOutcome::Ready(artifact));
        }

        if let Some(artifact) = self.store.get_artifact(fingerprint).await? {
            if artifact.is_expired() {
                debug!(fingerprint = %fingerprint, "durable artifact past expiry, treating as miss");
                return Ok(LookupOutcome::Miss);
            }
            self.tier2.put_artifact(fingerprint, &artifact, None).await?;
            self.tier1.put(fingerprint, artifact.clone(), None);
            return Ok(LookupOutcome::Ready(artifact));
        }

        Ok(LookupOutcome::Miss)
    }

    /// `reserve(F) -> leader | follower(job_id)` (§4.5 single-flight
    /// protocol). The leader creates and enqueues a job; a follower learns
    /// the in-flight job id from `job:index:<F>`.
    pub async fn reserve(&self, fingerprint: &Fingerprint, webhook_url: Option<String>) -> ApiResult<ReserveOutcome> {
        for attempt in 0..RESERVE_MAX_ATTEMPTS {
            let lock_key = self.tier2.lock_key(fingerprint);
            if self.tier2.try_acquire_lock(&lock_key, self.lock_ttl_seconds).await? {
                let job = JobRecord::new(fingerprint.clone(), webhook_url.clone());
                self.queue.enqueue(&job).await?;
                return Ok(ReserveOutcome::Leader(job.job_id));
            }

            if let Some(job_id) = self.queue.store().in_flight_for(fingerprint).await? {
                return Ok(ReserveOutcome::Follower(job_id));
            }

            // Lock held but index not yet written (race between SETNX and
            // the job write) - back off and retry rather than assume miss.
            debug!(fingerprint = %fingerprint, attempt, "reserve race, retrying");
            tokio::time::sleep(RESERVE_RETRY_BACKOFF).await;
        }

        Err(ApiError::service_unavailable(format!(
            "could not reserve or join an in-flight job for {fingerprint} after {RESERVE_MAX_ATTEMPTS} attempts"
        )))
    }

    /// `invalidate(F, scope)` (§4.5). Admin `clear_cache` drives this
    /// directly; it never touches job state (Open Question 1).
    pub async fn invalidate(&self, fingerprint: &Fingerprint, scope: CacheScope) -> ApiResult<()> {
        match scope {
            CacheScope::Local => {
                self.tier1.invalidate(fingerprint);
            }
            CacheScope::Shared => {
                self.tier1.invalidate(fingerprint);
                self.tier2.invalidate_artifact(fingerprint).await?;
            }
            CacheScope::Durable => {
                self.tier1.invalidate(fingerprint);
                self.tier2.invalidate_artifact(fingerprint).await?;
                self.store.delete_artifact(fingerprint).await?;
            }
        }
        Ok(())
    }

    pub fn tier1(&self) -> &Tier1Cache {
        &self.tier1
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }
}
