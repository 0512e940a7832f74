//! C5's `commit(F, artifact | failure)`: write C4 first (authoritative),
//! then C3, then release the single-flight lock. Tier-1 (C2) is
//! process-local to whichever node serves a lookup, so the worker does not
//! populate it directly; the admission path fills C2 by read-through
//! promotion on the next hit, per §4.5.

use tracing::{info, warn};
use ytx_cache::Tier2Cache;
use ytx_models::{Artifact, ErrorKind, Fingerprint};
use ytx_store::StoreClient;

pub struct Coordinator {
    store: StoreClient,
    cache: Tier2Cache,
}

impl Coordinator {
    pub fn new(store: StoreClient, cache: Tier2Cache) -> Self {
        Self { store, cache }
    }

    pub async fn commit_success(&self, artifact: &Artifact) -> Result<(), CommitError> {
        self.store.upsert_artifact(artifact).await?;
        self.cache.put_artifact(&artifact.fingerprint, artifact, None).await?;
        self.release_lock(&artifact.fingerprint).await;
        info!(fingerprint = %artifact.fingerprint, "committed artifact");
        Ok(())
    }

    /// A failed extraction has nothing to write to C4/C3 beyond releasing
    /// the lock so a later request can retry from scratch (invariant 2
    /// only binds when an artifact actually exists in C2/C3).
    pub async fn commit_failure(&self, fingerprint: &Fingerprint, _kind: ErrorKind) -> Result<(), CommitError> {
        self.release_lock(fingerprint).await;
        Ok(())
    }

    async fn release_lock(&self, fingerprint: &Fingerprint) {
        let lock_key = self.cache.lock_key(fingerprint);
        if let Err(e) = self.cache.release_lock(&lock_key).await {
            warn!(fingerprint = %fingerprint, error = %e, "failed to release single-flight lock");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("store error: {0}")]
    Store(#[from] ytx_store::StoreError),
    #[error("cache error: {0}")]
    Cache(#[from] ytx_cache::CacheError),
}
