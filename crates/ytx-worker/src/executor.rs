//! Job executor: the `dequeue → extract → commit → dispatch_webhook` loop
//! (§4.9), semaphore-bounded concurrency, a periodic reaper task, and
//! graceful shutdown via a watch channel under `tokio::select!`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use ytx_extractor::Extractor;
use ytx_models::{Artifact, JobRecord};
use ytx_queue::JobQueue;
use ytx_webhook::WebhookDispatcher;

use crate::commit::Coordinator;
use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

pub struct JobExecutor {
    config: WorkerConfig,
    queue: JobQueue,
    extractor: Arc<Extractor>,
    coordinator: Arc<Coordinator>,
    webhook: Arc<WebhookDispatcher>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl JobExecutor {
    pub fn new(
        config: WorkerConfig,
        queue: JobQueue,
        extractor: Extractor,
        coordinator: Coordinator,
        webhook: WebhookDispatcher,
    ) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        Self {
            config,
            queue,
            extractor: Arc::new(extractor),
            coordinator: Arc::new(coordinator),
            webhook: Arc::new(webhook),
            job_semaphore,
            shutdown,
        }
    }

    pub async fn run(&self) -> WorkerResult<()> {
        info!(max_concurrent_jobs = self.config.max_concurrent_jobs, "starting job executor");

        let mut shutdown_rx = self.shutdown.subscribe();
        let reaper_task = self.spawn_reaper();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_one() => {
                    if let Err(e) = result {
                        error!(error = %e, "error consuming jobs, backing off");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        reaper_task.abort();
        info!("waiting for in-flight jobs to complete");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;
        info!("job executor stopped");
        Ok(())
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    async fn consume_one(&self) -> WorkerResult<()> {
        let Some(job) = self.queue.dequeue().await? else {
            return Ok(());
        };

        let permit = self
            .job_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| crate::error::WorkerError::job_failed("semaphore closed"))?;

        let queue = self.queue.clone();
        let extractor = Arc::clone(&self.extractor);
        let coordinator = Arc::clone(&self.coordinator);
        let webhook = Arc::clone(&self.webhook);

        tokio::spawn(async move {
            let _permit = permit;
            Self::execute_job(queue, extractor, coordinator, webhook, job).await;
        });

        Ok(())
    }

    async fn execute_job(
        queue: JobQueue,
        extractor: Arc<Extractor>,
        coordinator: Arc<Coordinator>,
        webhook: Arc<WebhookDispatcher>,
        mut job: JobRecord,
    ) {
        let logger = JobLogger::new(&job.job_id, "extraction");
        logger.log_start(&job.fingerprint.encode());

        let artifact = extractor.extract(&job.fingerprint).await;

        match artifact {
            Ok(artifact) => {
                job.mark_finished();
                if let Err(e) = coordinator.commit_success(&artifact).await {
                    error!(job_id = %job.job_id, error = %e, "failed to commit artifact");
                }
                if let Err(e) = queue.complete(&job).await {
                    error!(job_id = %job.job_id, error = %e, "failed to persist terminal job state");
                }
                logger.log_completion("extraction finished");
                Self::dispatch_webhook(webhook, queue, job, Some(artifact)).await;
            }
            Err(e) => {
                let kind = e.kind();
                job.mark_failed(kind);
                if let Err(commit_err) = coordinator.commit_failure(&job.fingerprint, kind).await {
                    error!(job_id = %job.job_id, error = %commit_err, "failed to release lock on failure");
                }
                if let Err(persist_err) = queue.complete(&job).await {
                    error!(job_id = %job.job_id, error = %persist_err, "failed to persist failed job state");
                }
                logger.log_error(&format!("extraction failed: {e}"));
                Self::dispatch_webhook(webhook, queue, job, None).await;
            }
        }
    }

    /// Hand off delivery without blocking the consume loop: spawned as its
    /// own task, bounded only by the semaphore permit already released
    /// above (the permit is dropped before this runs).
    async fn dispatch_webhook(
        webhook: Arc<WebhookDispatcher>,
        queue: JobQueue,
        job: JobRecord,
        artifact: Option<Artifact>,
    ) {
        tokio::spawn(async move {
            match webhook.dispatch(&job, artifact.as_ref()).await {
                Ok(outcome) => {
                    let mut updated = job;
                    updated.webhook_delivery_status = outcome.status;
                    updated.attempts = outcome.attempts;
                    if let Err(e) = queue.complete(&updated).await {
                        warn!(job_id = %updated.job_id, error = %e, "failed to persist webhook delivery status");
                    }
                }
                Err(e) => {
                    warn!(job_id = %job.job_id, error = %e, "webhook dispatch errored before any attempt");
                }
            }
        });
    }

    fn spawn_reaper(&self) -> tokio::task::JoinHandle<()> {
        let queue = self.queue.clone();
        let interval = self.config.reap_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = Self::reap_once(&queue).await {
                    warn!(error = %e, "reaper pass failed");
                }
            }
        })
    }

    async fn reap_once(queue: &JobQueue) -> WorkerResult<()> {
        let reaped = queue.reap_expired().await?;
        if reaped > 0 {
            warn!(reaped, "reaper requeued jobs with expired leases");
        }
        Ok(())
    }

    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
