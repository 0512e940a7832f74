//! Job record persistence: keyed storage for [`ytx_models::JobRecord`] plus
//! the fingerprint → in-flight-job index used by C5's single-flight
//! protocol (§4.5 step 3).
//!
//! Every write goes through [`ytx_store::StoreClient`] first so the C4 job
//! table stays authoritative (§4.4, §6), then through the Tier-2 cache that
//! `dequeue`/`reap_expired` scan against — the same C4-before-C3 ordering
//! `ytx-worker`'s commit coordinator uses for artifacts.

use ytx_cache::Tier2Cache;
use ytx_models::{Fingerprint, JobId, JobRecord};
use ytx_store::StoreClient;

use crate::error::{QueueError, QueueResult};

fn job_key(job_id: &JobId) -> String {
    format!("job:{}", job_id.as_str())
}

fn job_index_key(fingerprint: &Fingerprint) -> String {
    format!("job:index:{}", fingerprint.encode())
}

/// Reads and writes job records through the shared Tier-2 cache, durably
/// persisting through [`StoreClient`] on every write. One instance is
/// shared by [`crate::queue::JobQueue`] and by C5's admission path, which
/// needs to resolve `job:index:<F>` without going through the list.
#[derive(Clone)]
pub struct JobStore {
    cache: Tier2Cache,
    store: StoreClient,
}

impl JobStore {
    pub fn new(cache: Tier2Cache, store: StoreClient) -> Self {
        Self { cache, store }
    }

    pub async fn put(&self, job: &JobRecord) -> QueueResult<()> {
        self.store.upsert_job(job).await?;
        let body = serde_json::to_string(job)?;
        self.cache.set_string(&job_key(&job.job_id), &body, None).await?;
        self.cache.set_string(&job_index_key(&job.fingerprint), job.job_id.as_str(), None).await?;
        Ok(())
    }

    pub async fn get(&self, job_id: &JobId) -> QueueResult<JobRecord> {
        let raw = self
            .cache
            .get_string(&job_key(job_id))
            .await?
            .ok_or_else(|| QueueError::job_not_found(job_id.as_str()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolve the job currently in flight for `fingerprint`, per the §4.5
    /// single-flight index. Returns `None` if no job is indexed (the
    /// caller should retry lock acquisition).
    pub async fn in_flight_for(&self, fingerprint: &Fingerprint) -> QueueResult<Option<JobId>> {
        let raw = self.cache.get_string(&job_index_key(fingerprint)).await?;
        Ok(raw.map(JobId::from))
    }

    pub async fn clear_index(&self, fingerprint: &Fingerprint) -> QueueResult<()> {
        self.cache.del(&job_index_key(fingerprint)).await?;
        Ok(())
    }
}
