//! Admin handlers (§6): `clear_cache`, `queue_stats`, `rate_limit_stats`,
//! `rate_limit_reset`. No auth surface in this spec — these routes are
//! expected to sit behind an operator-only network boundary, not a
//! principal check in-process.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use ytx_models::Fingerprint;

use crate::coordinator::CacheScope;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClearCacheRequest {
    pub scope: String,
    pub video_ref: String,
    pub language: Option<String>,
    #[serde(default)]
    pub clean_flag: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: bool,
    pub scope: String,
}

fn parse_scope(raw: &str) -> ApiResult<CacheScope> {
    match raw {
        "local" => Ok(CacheScope::Local),
        "shared" => Ok(CacheScope::Shared),
        "durable" => Ok(CacheScope::Durable),
        other => Err(ApiError::bad_request(format!("unknown cache scope: {other}"))),
    }
}

/// `clear_cache(scope, fingerprint?)` (§6). Purging durable artifacts does
/// not cancel in-flight jobs for the same fingerprint; this only ever
/// touches artifact storage, never job/queue state.
pub async fn clear_cache(
    State(state): State<AppState>,
    Json(req): Json<ClearCacheRequest>,
) -> ApiResult<Json<ClearCacheResponse>> {
    let scope = parse_scope(&req.scope)?;
    let fingerprint = Fingerprint::canonicalise(&req.video_ref, req.language.as_deref(), req.clean_flag)?;

    state.coordinator.invalidate(&fingerprint, scope).await?;
    info!(fingerprint = %fingerprint, scope = %req.scope, "admin cleared cache");

    Ok(Json(ClearCacheResponse { cleared: true, scope: req.scope }))
}

#[derive(Debug, Serialize)]
pub struct QueueStatsResponse {
    pub depth: u64,
}

/// `queue_stats()` (§6): current FIFO depth.
pub async fn queue_stats(State(state): State<AppState>) -> ApiResult<Json<QueueStatsResponse>> {
    let depth = state.queue.depth().await?;
    Ok(Json(QueueStatsResponse { depth }))
}

#[derive(Debug, Serialize)]
pub struct RateLimitStatsResponse {
    pub principal: String,
    pub buckets: Vec<EndpointBucket>,
}

#[derive(Debug, Serialize)]
pub struct EndpointBucket {
    pub endpoint: String,
    pub tokens_remaining: f64,
    pub capacity: f64,
}

/// `rate_limit_stats(principal)` (§6): current token level per endpoint
/// the principal has touched.
pub async fn rate_limit_stats(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> ApiResult<Json<RateLimitStatsResponse>> {
    let stats = state.rate_limiter.stats_for_principal(&principal).await?;
    Ok(Json(RateLimitStatsResponse {
        principal,
        buckets: stats
            .into_iter()
            .map(|s| EndpointBucket { endpoint: s.endpoint, tokens_remaining: s.tokens_remaining, capacity: s.capacity })
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct RateLimitResetResponse {
    pub principal: String,
    pub buckets_cleared: u64,
}

/// `rate_limit_reset(principal)` (§6): restores a full allowance across
/// every endpoint bucket for the principal.
pub async fn rate_limit_reset(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> ApiResult<Json<RateLimitResetResponse>> {
    let cleared = state.rate_limiter.reset_principal(&principal).await?;
    info!(principal = %principal, cleared, "admin reset rate limit");
    Ok(Json(RateLimitResetResponse { principal, buckets_cleared: cleared }))
}
