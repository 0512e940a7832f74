//! Durable FIFO job queue (C7), backed by a plain Redis list rather than
//! this codebase's usual Streams consumer-group setup: the queue has no
//! need for multiple logical consumer groups or replay, just strict FIFO
//! with a reaper for abandoned leases (§4.7).

use std::time::Duration;

use tracing::{info, warn};
use ytx_cache::Tier2Cache;
use ytx_models::{JobId, JobRecord, JobStatus};
use ytx_store::StoreClient;

use crate::error::QueueResult;
use crate::job::JobStore;

const QUEUE_LIST_KEY: &str = "queue:jobs";

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How long a `dequeue` blocks waiting for work before returning `None`.
    pub dequeue_timeout_seconds: f64,
    /// `extraction_timeout + margin`: a `running` job older than this is
    /// considered abandoned by the reaper.
    pub lease_seconds: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { dequeue_timeout_seconds: 5.0, lease_seconds: 45 }
    }
}

/// The durable FIFO itself: a Redis list of job ids plus the job records
/// addressed through [`JobStore`].
#[derive(Clone)]
pub struct JobQueue {
    cache: Tier2Cache,
    store: JobStore,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(cache: Tier2Cache, store: StoreClient, config: QueueConfig) -> Self {
        let store = JobStore::new(cache.clone(), store);
        Self { cache, store, config }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Push `job.job_id` onto the list and persist the record with
    /// `status=queued`. The two writes are not atomic; a worker that pops
    /// an id whose record is missing treats it as an orphan and drops it.
    pub async fn enqueue(&self, job: &JobRecord) -> QueueResult<()> {
        self.store.put(job).await?;
        self.cache.list_push(QUEUE_LIST_KEY, job.job_id.as_str()).await?;
        metrics::gauge!("ytx_queue_depth").increment(1.0);
        info!(job_id = %job.job_id, fingerprint = %job.fingerprint, "job enqueued");
        Ok(())
    }

    /// Blocking pop with the configured timeout. Transitions the record to
    /// `running` and returns it; `None` means the timeout elapsed with no
    /// work available.
    pub async fn dequeue(&self) -> QueueResult<Option<JobRecord>> {
        loop {
            let Some(job_id) =
                self.cache.list_blocking_pop(QUEUE_LIST_KEY, self.config.dequeue_timeout_seconds).await?
            else {
                return Ok(None);
            };

            let job_id = JobId::from(job_id);
            let mut job = match self.store.get(&job_id).await {
                Ok(job) => job,
                Err(_) => {
                    warn!(job_id = %job_id, "dequeued orphan list entry with no job record, dropping");
                    continue;
                }
            };

            if job.status != JobStatus::Queued {
                // Already reclaimed by a reaper elsewhere, or a duplicate
                // list entry from a non-atomic enqueue retry. Skip it.
                continue;
            }

            job.mark_running();
            self.store.put(&job).await?;
            metrics::gauge!("ytx_queue_depth").decrement(1.0);
            return Ok(Some(job));
        }
    }

    /// Persist a terminal job state. Callers should have already called
    /// `job.mark_finished()` / `job.mark_failed()`.
    pub async fn complete(&self, job: &JobRecord) -> QueueResult<()> {
        debug_assert!(job.status.is_terminal());
        self.store.put(job).await?;
        self.store.clear_index(&job.fingerprint).await?;
        Ok(())
    }

    pub async fn fetch(&self, job_id: &JobId) -> QueueResult<JobRecord> {
        self.store.get(job_id).await
    }

    pub async fn depth(&self) -> QueueResult<u64> {
        Ok(self.cache.list_len(QUEUE_LIST_KEY).await?)
    }

    /// Reset a `running` job whose lease has expired back to `queued` and
    /// requeue its id at the front of the list, so it is picked up before
    /// newer arrivals. Intended to be driven by a periodic reaper task in
    /// the worker runtime.
    pub async fn reap(&self, job: &mut JobRecord) -> QueueResult<()> {
        job.reset_to_queued();
        self.store.put(job).await?;
        self.cache.list_push_front(QUEUE_LIST_KEY, job.job_id.as_str()).await?;
        warn!(job_id = %job.job_id, "requeued job with expired lease");
        Ok(())
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.config.lease_seconds.max(0) as u64)
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Scan for `running` jobs whose lease has expired and reset them to
    /// `queued` (§4.7 crash recovery). Returns the number reaped. Uses the
    /// cursor-based scan rather than a full keyspace read, per §5.
    pub async fn reap_expired(&self) -> QueueResult<u64> {
        let keys = self.cache.scan_match("job:*").await?;
        let lease = self.config.lease_seconds;
        let mut reaped = 0u64;

        for key in keys {
            if key.starts_with("job:index:") {
                continue;
            }
            let Some(job_id) = key.strip_prefix("job:") else { continue };
            let job_id = JobId::from(job_id.to_string());

            let Ok(mut job) = self.store.get(&job_id).await else { continue };
            if job.status != JobStatus::Running {
                continue;
            }
            let Some(started_at) = job.started_at else { continue };
            let age = chrono::Utc::now().signed_duration_since(started_at);
            if age.num_seconds() > lease {
                self.reap(&mut job).await?;
                reaped += 1;
            }
        }

        Ok(reaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_bounds() {
        let config = QueueConfig::default();
        assert!(config.dequeue_timeout_seconds > 0.0);
        assert!(config.lease_seconds > 0);
    }
}
