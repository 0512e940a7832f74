//! Proxy rotator: a pool of upstream HTTP proxies, loaded at startup,
//! selected by lowest failure count among those outside cooldown.
//!
//! Follows this codebase's existing rotating-address-pool shape (a
//! `RwLock`-guarded pool, refreshed on a TTL, selected by lowest failure
//! count) adapted from rotating local network addresses to rotating
//! upstream HTTP proxy endpoints with credentials. Unlike that module, the
//! pool here is owned by the caller (dependency-injected), not a process
//! global, per this codebase's value-type/DI redesign.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyDescriptor {
    pub endpoint: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
struct ProxyEntry {
    descriptor: ProxyDescriptor,
    failure_count: u32,
    cooldown_until: Option<Instant>,
}

/// Aggregate pool health, reported for observability (§4.8).
#[derive(Debug, Clone, Copy)]
pub struct ProxyPoolHealth {
    pub total: usize,
    pub available: usize,
    pub in_cooldown: usize,
}

pub struct ProxyRotator {
    entries: RwLock<Vec<ProxyEntry>>,
    max_failures: u32,
    cooldown: Duration,
}

impl ProxyRotator {
    pub fn new(pool: Vec<ProxyDescriptor>, max_failures: u32, cooldown: Duration) -> Self {
        let entries = pool
            .into_iter()
            .map(|descriptor| ProxyEntry { descriptor, failure_count: 0, cooldown_until: None })
            .collect();
        Self { entries: RwLock::new(entries), max_failures, cooldown }
    }

    pub fn empty(max_failures: u32, cooldown: Duration) -> Self {
        Self::new(Vec::new(), max_failures, cooldown)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// Pick the proxy with lowest failure count among those whose cooldown
    /// has passed; ties broken randomly so load spreads across the pool.
    pub fn select(&self) -> Option<ProxyDescriptor> {
        let now = Instant::now();
        let entries = self.entries.read().ok()?;
        let mut candidates: Vec<&ProxyEntry> = entries
            .iter()
            .filter(|e| e.cooldown_until.map(|until| now >= until).unwrap_or(true))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by_key(|e| e.failure_count);
        let lowest = candidates[0].failure_count;
        let tied: Vec<&&ProxyEntry> = candidates.iter().filter(|e| e.failure_count == lowest).collect();
        let chosen = tied.choose(&mut rand::thread_rng())?;
        Some(chosen.descriptor.clone())
    }

    pub fn record_failure(&self, endpoint: &str) {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.iter_mut().find(|e| e.descriptor.endpoint == endpoint) {
            entry.failure_count += 1;
            if entry.failure_count >= self.max_failures {
                entry.cooldown_until = Some(Instant::now() + self.cooldown);
                warn!(endpoint, failures = entry.failure_count, "proxy entered cooldown");
            }
        }
    }

    pub fn record_success(&self, endpoint: &str) {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.iter_mut().find(|e| e.descriptor.endpoint == endpoint) {
            if entry.failure_count > 0 || entry.cooldown_until.is_some() {
                debug!(endpoint, "proxy recovered, resetting failure count");
            }
            entry.failure_count = 0;
            entry.cooldown_until = None;
        }
    }

    /// Reset failure counters on entries whose cooldown has expired.
    pub fn reap_expired_cooldowns(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        for entry in entries.iter_mut() {
            if let Some(until) = entry.cooldown_until {
                if now >= until {
                    entry.failure_count = 0;
                    entry.cooldown_until = None;
                }
            }
        }
    }

    pub fn health(&self) -> ProxyPoolHealth {
        let now = Instant::now();
        let entries = self.entries.read().unwrap();
        let total = entries.len();
        let in_cooldown = entries.iter().filter(|e| e.cooldown_until.map(|u| now < u).unwrap_or(false)).count();
        ProxyPoolHealth { total, available: total - in_cooldown, in_cooldown }
    }

    pub fn load_from_path(path: &str, max_failures: u32, cooldown: Duration) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let pool: Vec<ProxyDescriptor> = serde_json::from_str(&contents)?;
        info!(count = pool.len(), path, "loaded proxy pool");
        Ok(Self::new(pool, max_failures, cooldown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(endpoint: &str) -> ProxyDescriptor {
        ProxyDescriptor { endpoint: endpoint.to_string(), username: None, password: None }
    }

    #[test]
    fn selects_lowest_failure_count() {
        let rotator = ProxyRotator::new(vec![desc("a"), desc("b")], 3, Duration::from_secs(60));
        rotator.record_failure("a");
        let selected = rotator.select().unwrap();
        assert_eq!(selected.endpoint, "b");
    }

    #[test]
    fn cooldown_excludes_entry_until_expired() {
        let rotator = ProxyRotator::new(vec![desc("a")], 1, Duration::from_millis(10));
        rotator.record_failure("a");
        assert!(rotator.select().is_none());
        std::thread::sleep(Duration::from_millis(20));
        assert!(rotator.select().is_some());
    }

    #[test]
    fn empty_pool_never_selects() {
        let rotator = ProxyRotator::empty(3, Duration::from_secs(60));
        assert!(rotator.select().is_none());
    }
}
