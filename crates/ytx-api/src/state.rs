//! Application state.

use std::sync::Arc;

use ytx_cache::{CacheConfig, Tier1Cache, Tier2Cache};
use ytx_queue::{JobQueue, QueueConfig};
use ytx_store::StoreClient;

use crate::config::ApiConfig;
use crate::coordinator::Coordinator;
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};

/// Shared application state: the admission orchestrator (C5+C6 wiring)
/// plus the raw client handles admin operations need directly.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub coordinator: Arc<Coordinator>,
    pub rate_limiter: Arc<RateLimiter>,
    pub queue: JobQueue,
    pub store: Arc<StoreClient>,
}

impl AppState {
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let cache_config = CacheConfig::from_env();
        let tier1 = Arc::new(Tier1Cache::new(cache_config.c2_capacity, cache_config.c2_ttl_seconds));
        let tier2 = Tier2Cache::new(&cache_config.redis_url, cache_config.c3_ttl_seconds)?;

        let store = Arc::new(StoreClient::from_env().await?);
        store.migrate().await?;

        let queue = JobQueue::new(tier2.clone(), (*store).clone(), QueueConfig::default());

        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&tier1),
            tier2.clone(),
            Arc::clone(&store),
            queue.clone(),
            config.lock_ttl_seconds(),
        ));

        let rate_limiter = Arc::new(RateLimiter::new(tier2.clone(), RateLimiterConfig::from_env()));

        Ok(Self { config, coordinator, rate_limiter, queue, store })
    }
}
