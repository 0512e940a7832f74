//! Store configuration.

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Retention window for artifacts (§4.4, default 30 days).
    pub retention_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/ytx".to_string(),
            max_connections: 10,
            retention_days: 30,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(default.database_url),
            max_connections: std::env::var("STORE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_connections),
            retention_days: std::env::var("C4_RETENTION_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.retention_days),
        }
    }
}
