//! Tier-1 cache (C2): a bounded, process-local LRU with per-entry TTL.
//!
//! Not shared across workers; correctness never depends on it. It is an
//! opportunistic accelerator in front of Tier-2/Tier-3.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use ytx_models::{Artifact, Fingerprint};

struct Entry {
    artifact: Artifact,
    expires_at: DateTime<Utc>,
}

pub struct Tier1Cache {
    inner: Mutex<LruCache<String, Entry>>,
    default_ttl_seconds: u64,
}

impl Tier1Cache {
    pub fn new(capacity: usize, default_ttl_seconds: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity must be nonzero");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            default_ttl_seconds,
        }
    }

    /// Returns the cached artifact, or `None` on miss or TTL expiry.
    /// Expired entries are evicted eagerly on access.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Artifact> {
        let key = fingerprint.encode();
        let mut inner = self.inner.lock();
        match inner.get(&key) {
            Some(entry) if entry.expires_at > Utc::now() => {
                metrics::counter!("ytx_tier1_hit_total").increment(1);
                Some(entry.artifact.clone())
            }
            Some(_) => {
                inner.pop(&key);
                metrics::counter!("ytx_tier1_miss_total").increment(1);
                None
            }
            None => {
                metrics::counter!("ytx_tier1_miss_total").increment(1);
                None
            }
        }
    }

    pub fn put(&self, fingerprint: &Fingerprint, artifact: Artifact, ttl_seconds: Option<u64>) {
        let key = fingerprint.encode();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl_seconds);
        let expires_at = Utc::now() + chrono::Duration::seconds(ttl as i64);
        self.inner.lock().put(key, Entry { artifact, expires_at });
    }

    pub fn invalidate(&self, fingerprint: &Fingerprint) {
        self.inner.lock().pop(&fingerprint.encode());
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ytx_models::{Engine, Segment};

    fn fp(id: &str) -> Fingerprint {
        Fingerprint::canonicalise(id, None, None).unwrap()
    }

    fn artifact(fingerprint: Fingerprint) -> Artifact {
        Artifact::new(
            fingerprint,
            Some("title".to_string()),
            Engine::Primary,
            vec![Segment { text: "hi".into(), start_seconds: 0.0, duration_seconds: 1.0 }],
            100,
            chrono::Duration::seconds(60),
        )
    }

    #[test]
    fn put_then_get_hits() {
        let cache = Tier1Cache::new(8, 300);
        let f = fp("dQw4w9WgXcQ");
        cache.put(&f, artifact(f.clone()), None);
        assert!(cache.get(&f).is_some());
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache = Tier1Cache::new(8, 300);
        let f = fp("dQw4w9WgXcQ");
        assert!(cache.get(&f).is_none());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = Tier1Cache::new(8, 300);
        let f = fp("dQw4w9WgXcQ");
        cache.put(&f, artifact(f.clone()), Some(0));
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(cache.get(&f).is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = Tier1Cache::new(8, 300);
        let f = fp("dQw4w9WgXcQ");
        cache.put(&f, artifact(f.clone()), None);
        cache.invalidate(&f);
        assert!(cache.get(&f).is_none());
    }

    #[test]
    fn eviction_respects_capacity() {
        let cache = Tier1Cache::new(1, 300);
        let a = fp("aaaaaaaaaaa");
        let b = fp("bbbbbbbbbbb");
        cache.put(&a, artifact(a.clone()), None);
        cache.put(&b, artifact(b.clone()), None);
        assert!(cache.get(&a).is_none());
        assert!(cache.get(&b).is_some());
    }
}
