//! Tier-2 cache (C3): a shared key/value store with TTL, atomic increments,
//! compare-and-set locks, cursor-based scans, and FIFO list primitives.
//!
//! Implemented against the same Redis client and TLS configuration already
//! used elsewhere in this stack (`redis` crate, `tokio-comp`, `tls-rustls`).

use redis::AsyncCommands;
use tracing::{debug, warn};
use ytx_models::{Artifact, Fingerprint};

use crate::error::{CacheError, CacheResult};

#[derive(Clone)]
pub struct Tier2Cache {
    client: redis::Client,
    default_ttl_seconds: u64,
}

fn artifact_key(fingerprint: &Fingerprint) -> String {
    format!("artifact:{}", fingerprint.encode())
}

fn lock_key(fingerprint: &Fingerprint) -> String {
    format!("lock:{}", fingerprint.encode())
}

const TOKEN_BUCKET_SCRIPT: &str = r#"
local tokens_key = KEYS[1]
local timestamp_key = KEYS[2]
local capacity = tonumber(ARGV[1])
local refill_per_ms = tonumber(ARGV[2])
local now_ms = tonumber(ARGV[3])
local ttl = tonumber(ARGV[4])

local tokens = tonumber(redis.call('GET', tokens_key))
local last_refill = tonumber(redis.call('GET', timestamp_key))
if tokens == nil then tokens = capacity end
if last_refill == nil then last_refill = now_ms end

local elapsed = math.max(0, now_ms - last_refill)
tokens = math.min(capacity, tokens + elapsed * refill_per_ms)

local allowed = 0
if tokens >= 1 then
    allowed = 1
    tokens = tokens - 1
end

redis.call('SET', tokens_key, tostring(tokens), 'EX', ttl)
redis.call('SET', timestamp_key, tostring(now_ms), 'EX', ttl)

return {allowed, tostring(tokens)}
"#;

impl Tier2Cache {
    pub fn new(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client, default_ttl_seconds })
    }

    async fn conn(&self) -> CacheResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Read-through lookup: `artifact:<F>` string value, JSON-decoded.
    pub async fn get_artifact(&self, fingerprint: &Fingerprint) -> CacheResult<Option<Artifact>> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(artifact_key(fingerprint)).await?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    pub async fn put_artifact(
        &self,
        fingerprint: &Fingerprint,
        artifact: &Artifact,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let payload = serde_json::to_string(artifact)?;
        let ttl = ttl_seconds.unwrap_or(self.default_ttl_seconds);
        conn.set_ex::<_, _, ()>(artifact_key(fingerprint), payload, ttl).await?;
        Ok(())
    }

    pub async fn invalidate_artifact(&self, fingerprint: &Fingerprint) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(artifact_key(fingerprint)).await?;
        Ok(())
    }

    /// Generic string get/set/del, used by the job index and queue modules.
    pub async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.get(key).await?)
    }

    pub async fn set_string(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        match ttl_seconds {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    pub async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Atomic increment with a sliding TTL, used by the rate limiter and
    /// retry counters.
    pub async fn incr(&self, key: &str, ttl_seconds: u64) -> CacheResult<i64> {
        let mut conn = self.conn().await?;
        let count: i64 = conn.incr(key, 1).await?;
        conn.expire::<_, ()>(key, ttl_seconds as i64).await?;
        Ok(count)
    }

    /// Acquire a single-flight lock via `SET key val NX EX ttl` (§4.5 step 1).
    pub async fn try_acquire_lock(&self, key: &str, ttl_seconds: u64) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let acquired: bool = redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .unwrap_or(false);
        if acquired {
            debug!(key, "acquired cas lock");
        }
        Ok(acquired)
    }

    pub async fn release_lock(&self, key: &str) -> CacheResult<()> {
        self.del(key).await
    }

    pub fn lock_key(&self, fingerprint: &Fingerprint) -> String {
        lock_key(fingerprint)
    }

    /// Cursor-based key scan. MUST be used instead of `KEYS` in every admin
    /// path (§5: "no component performs a full-keyspace scan").
    pub async fn scan_match(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut matched = Vec::new();
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await?;
            matched.extend(batch);
            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }
        Ok(matched)
    }

    /// FIFO list push, used by the job queue (§4.7).
    pub async fn list_push(&self, list_key: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        conn.rpush::<_, _, ()>(list_key, value).await?;
        Ok(())
    }

    /// Blocking FIFO pop with a bounded timeout; `None` on timeout.
    pub async fn list_blocking_pop(&self, list_key: &str, timeout_seconds: f64) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        let result: Option<(String, String)> = conn.blpop(list_key, timeout_seconds).await?;
        Ok(result.map(|(_, value)| value))
    }

    pub async fn list_len(&self, list_key: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.llen(list_key).await?)
    }

    /// Non-blocking immediate pop, used by the reaper to requeue orphans.
    pub async fn list_push_front(&self, list_key: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        conn.lpush::<_, _, ()>(list_key, value).await?;
        Ok(())
    }

    /// Atomic token-bucket refill-then-consume (§4.6), run as a Lua script
    /// so the read-refill-write-consume cycle is a single round trip rather
    /// than a separate CAS loop. `refill_per_ms` tokens accrue per
    /// millisecond elapsed since the bucket's last touch, capped at
    /// `capacity`; on success one token is deducted. Returns
    /// `(allowed, tokens_remaining_after)`.
    pub async fn take_rate_limit_token(
        &self,
        bucket_key: &str,
        capacity: f64,
        refill_per_ms: f64,
        now_unix_ms: i64,
        ttl_seconds: u64,
    ) -> CacheResult<(bool, f64)> {
        let mut conn = self.conn().await?;
        let tokens_key = format!("{bucket_key}:tokens");
        let timestamp_key = format!("{bucket_key}:ts");
        let (allowed, remaining): (i64, String) = redis::Script::new(TOKEN_BUCKET_SCRIPT)
            .key(tokens_key)
            .key(timestamp_key)
            .arg(capacity.to_string())
            .arg(refill_per_ms.to_string())
            .arg(now_unix_ms)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await?;
        Ok((allowed == 1, remaining.parse().unwrap_or(0.0)))
    }

    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await.map_err(|e| {
            warn!(error = %e, "tier-2 cache unreachable");
            CacheError::Redis(e)
        })?;
        Ok(())
    }
}
