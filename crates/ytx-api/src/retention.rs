//! Background retention sweep: periodically purges artifacts past the C4
//! retention window and reaps abandoned job leases (§4.4, §4.7), run as a
//! task spawned from `main.rs` alongside the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};
use ytx_queue::JobQueue;
use ytx_store::StoreClient;

const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

pub struct RetentionSweeper {
    store: Arc<StoreClient>,
    queue: JobQueue,
    enabled: bool,
}

impl RetentionSweeper {
    pub fn new(store: Arc<StoreClient>, queue: JobQueue) -> Self {
        let enabled = std::env::var("ENABLE_RETENTION_SWEEP")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);
        Self { store, queue, enabled }
    }

    /// Run the sweep loop. Intended to be spawned as a background task;
    /// never returns under normal operation.
    pub async fn run(&self) {
        if !self.enabled {
            info!("retention sweep disabled");
            return;
        }

        info!(interval = ?SWEEP_INTERVAL, "starting retention sweeper");
        let mut ticker = interval(SWEEP_INTERVAL);

        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_once().await {
                error!(error = %e, "retention sweep failed");
            }
        }
    }

    async fn sweep_once(&self) -> Result<(), Box<dyn std::error::Error>> {
        let expired_artifacts = self.store.sweep_expired_artifacts().await?;
        let reaped_leases = self.queue.reap_expired().await?;

        if expired_artifacts > 0 || reaped_leases > 0 {
            info!(expired_artifacts, reaped_leases, "retention sweep complete");
        }
        Ok(())
    }
}
