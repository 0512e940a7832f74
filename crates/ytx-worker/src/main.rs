//! Worker binary: wires C4/C3/C7/C8/C10 together and runs the executor.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytx_cache::{CacheConfig, Tier2Cache};
use ytx_extractor::{Extractor, ExtractorConfig, FallbackEngine, PrimaryEngine, ProxyRotator};
use ytx_queue::{JobQueue, QueueConfig};
use ytx_store::{StoreClient, StoreConfig};
use ytx_webhook::{WebhookConfig, WebhookDispatcher};
use ytx_worker::{Coordinator, JobExecutor, WorkerConfig};

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive("ytx=info".parse().unwrap()))
        .init();

    info!("starting ytx-worker");

    let worker_config = WorkerConfig::from_env();
    let cache_config = CacheConfig::from_env();
    let extractor_config = ExtractorConfig::from_env();
    let webhook_config = WebhookConfig::from_env();

    let cache = match Tier2Cache::new(&cache_config.redis_url, cache_config.c3_ttl_seconds) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to construct tier-2 cache client");
            std::process::exit(1);
        }
    };

    let store = match StoreClient::connect(&StoreConfig::from_env()).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to connect to store");
            std::process::exit(1);
        }
    };
    if let Err(e) = store.migrate().await {
        error!(error = %e, "failed to run store migrations");
        std::process::exit(1);
    }

    let cooldown = std::time::Duration::from_secs(extractor_config.proxy_cooldown_seconds);
    let rotator = match &extractor_config.proxy_pool_path {
        Some(path) => match ProxyRotator::load_from_path(path, extractor_config.proxy_max_failures, cooldown) {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "failed to load proxy pool, starting without proxies");
                ProxyRotator::empty(extractor_config.proxy_max_failures, cooldown)
            }
        },
        None => ProxyRotator::empty(extractor_config.proxy_max_failures, cooldown),
    };

    let extractor = Extractor::new(PrimaryEngine::default(), FallbackEngine::default(), rotator, extractor_config);

    let webhook = match WebhookDispatcher::new(webhook_config) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "failed to construct webhook dispatcher");
            std::process::exit(1);
        }
    };

    let queue = JobQueue::new(cache.clone(), store.clone(), QueueConfig::default());
    let coordinator = Coordinator::new(store, cache);

    let executor = JobExecutor::new(worker_config, queue, extractor, coordinator, webhook);

    let shutdown_handle = tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
    });

    if let Err(e) = executor.run().await {
        error!(error = %e, "executor error");
        std::process::exit(1);
    }

    shutdown_handle.await.ok();
    info!("worker shutdown complete");
}
