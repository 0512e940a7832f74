//! Cache configuration.

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL backing Tier-2 (C3).
    pub redis_url: String,
    /// Tier-1 (C2) bounded LRU capacity, entry count.
    pub c2_capacity: usize,
    /// Tier-1 (C2) default entry TTL.
    pub c2_ttl_seconds: u64,
    /// Tier-2 (C3) default entry TTL.
    pub c3_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            c2_capacity: 1024,
            c2_ttl_seconds: 300,
            c3_ttl_seconds: 3600,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(default.redis_url),
            c2_capacity: std::env::var("C2_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.c2_capacity),
            c2_ttl_seconds: std::env::var("C2_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.c2_ttl_seconds),
            c3_ttl_seconds: std::env::var("C3_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.c3_ttl_seconds),
        }
    }
}
