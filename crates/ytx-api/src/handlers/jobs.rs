//! Ingress handlers implementing §6's external interface: `submit`,
//! `lookup_cached`, `submit_batch`, `job_status`.

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use ytx_models::{Artifact, Fingerprint, JobId, JobStatus, RateLimitOutcome};

use crate::coordinator::{LookupOutcome, ReserveOutcome};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::client_ip_from_parts;
use crate::state::AppState;

/// Resolve the C6 rate-limit principal for this (unauthenticated) admission
/// path: the client's IP, same resolution order as the ambient per-IP
/// throttle. Falls back to a fixed key so a request with neither a proxy
/// header nor connection info still shares one global bucket rather than
/// bypassing the limiter entirely.
fn principal_from(headers: &HeaderMap, connect_info: Option<SocketAddr>) -> String {
    client_ip_from_parts(headers, connect_info).map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".to_string())
}

/// Enforce the C6 token bucket for `(principal, endpoint)` (§4.11 step 2).
/// On `Deny`, records the metric and returns `RateLimited`. On `Allow`,
/// returns the headers the spec requires publishing on the response.
async fn enforce_rate_limit(state: &AppState, principal: &str, endpoint: &str) -> ApiResult<HeaderMap> {
    match state.rate_limiter.check(principal, endpoint).await {
        RateLimitOutcome::Allow { remaining, reset_at_unix_ms } => {
            let mut headers = HeaderMap::new();
            if let Ok(v) = HeaderValue::from_str(&remaining.floor().to_string()) {
                headers.insert(HeaderName::from_static("x-ratelimit-remaining"), v);
            }
            if let Ok(v) = HeaderValue::from_str(&reset_at_unix_ms.to_string()) {
                headers.insert(HeaderName::from_static("x-ratelimit-reset"), v);
            }
            if let Ok(v) = HeaderValue::from_str(&state.rate_limiter.config().rate_per_minute.to_string()) {
                headers.insert(HeaderName::from_static("x-ratelimit-limit"), v);
            }
            Ok(headers)
        }
        RateLimitOutcome::Deny { retry_after_seconds, reset_at_unix_ms } => {
            metrics::record_rate_limit_denial(endpoint);
            Err(ApiError::RateLimited { retry_after_seconds, reset_at_unix_ms })
        }
    }
}

/// Merge rate-limit headers onto a JSON body, matching the header-mutation
/// pattern `ApiError`'s `IntoResponse` impl uses for its own `RateLimited` arm.
fn with_rate_limit_headers<T: Serialize>(body: T, rl_headers: HeaderMap) -> Response {
    let mut response = Json(body).into_response();
    response.headers_mut().extend(rl_headers);
    response
}

const MAX_VIDEO_REF_LEN: usize = 2048;
const MAX_LANGUAGE_LEN: usize = 35;

fn validate_video_ref(video_ref: &str) -> ApiResult<()> {
    if video_ref.is_empty() || video_ref.len() > MAX_VIDEO_REF_LEN {
        return Err(ApiError::Validation(format!("video_ref must be 1-{MAX_VIDEO_REF_LEN} characters")));
    }
    Ok(())
}

fn validate_language(language: Option<&str>) -> ApiResult<()> {
    match language {
        Some(lang) if lang.is_empty() || lang.len() > MAX_LANGUAGE_LEN => {
            Err(ApiError::Validation(format!("language must be 1-{MAX_LANGUAGE_LEN} characters")))
        }
        _ => Ok(()),
    }
}

fn validate_webhook_url(webhook_url: Option<&str>) -> ApiResult<()> {
    match webhook_url {
        Some(raw) => url::Url::parse(raw)
            .map(|_| ())
            .map_err(|_| ApiError::Validation(format!("invalid webhook_url: {raw}"))),
        None => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub video_ref: String,
    pub language: Option<String>,
    #[serde(default)]
    pub clean_flag: Option<bool>,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResponse {
    Ready { artifact: ArtifactResponse },
    Queued { job_id: String },
}

#[derive(Debug, Serialize)]
pub struct ArtifactResponse {
    pub video_id: String,
    pub language: String,
    pub clean_flag: bool,
    pub title: Option<String>,
    pub engine_used: &'static str,
    pub segments: Vec<SegmentResponse>,
    pub plain_text: Option<String>,
    pub created_at: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub text: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl From<Artifact> for ArtifactResponse {
    fn from(a: Artifact) -> Self {
        Self {
            video_id: a.fingerprint.video_id,
            language: a.fingerprint.language,
            clean_flag: a.fingerprint.clean_flag,
            title: a.title,
            engine_used: a.engine_used.as_str(),
            segments: a
                .segments
                .into_iter()
                .map(|s| SegmentResponse { text: s.text, start_seconds: s.start_seconds, duration_seconds: s.duration_seconds })
                .collect(),
            plain_text: a.plain_text,
            created_at: a.created_at.to_rfc3339(),
            expires_at: a.expires_at.to_rfc3339(),
        }
    }
}

fn canonicalise(req_ref: &str, language: Option<&str>, clean_flag: Option<bool>) -> ApiResult<Fingerprint> {
    Fingerprint::canonicalise(req_ref, language, clean_flag)
        .map_err(|e| ApiError::InvalidInput(e.to_string()))
}

/// `submit(video_ref, language, clean_flag, webhook_url?) -> Ready | Queued`
/// (§4.11): canonicalise, enforce the C6 token bucket, lookup, reserve on
/// miss, enqueue on reserve-as-leader.
pub async fn submit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<Response> {
    validate_video_ref(&req.video_ref)?;
    validate_language(req.language.as_deref())?;
    validate_webhook_url(req.webhook_url.as_deref())?;
    let fingerprint = canonicalise(&req.video_ref, req.language.as_deref(), req.clean_flag)?;

    let principal = principal_from(&headers, Some(addr));
    let rl_headers = enforce_rate_limit(&state, &principal, "submit").await?;

    let body = match state.coordinator.lookup(&fingerprint).await? {
        LookupOutcome::Ready(artifact) => {
            metrics::record_admission("ready");
            SubmitResponse::Ready { artifact: artifact.into() }
        }
        LookupOutcome::Miss => match state.coordinator.reserve(&fingerprint, req.webhook_url).await? {
            ReserveOutcome::Leader(job_id) => {
                metrics::record_admission("queued_leader");
                info!(fingerprint = %fingerprint, job_id = %job_id, "admitted as leader");
                SubmitResponse::Queued { job_id: job_id.to_string() }
            }
            ReserveOutcome::Follower(job_id) => {
                metrics::record_admission("queued_follower");
                SubmitResponse::Queued { job_id: job_id.to_string() }
            }
        },
    };

    Ok(with_rate_limit_headers(body, rl_headers))
}

#[derive(Debug, Deserialize)]
pub struct LookupCachedRequest {
    pub video_ref: String,
    pub language: Option<String>,
    #[serde(default)]
    pub clean_flag: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupCachedResponse {
    Ready { artifact: ArtifactResponse },
    NotCached,
}

pub async fn lookup_cached(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LookupCachedRequest>,
) -> ApiResult<Response> {
    validate_video_ref(&req.video_ref)?;
    validate_language(req.language.as_deref())?;
    let fingerprint = canonicalise(&req.video_ref, req.language.as_deref(), req.clean_flag)?;

    let principal = principal_from(&headers, Some(addr));
    let rl_headers = enforce_rate_limit(&state, &principal, "lookup").await?;

    let body = match state.coordinator.lookup(&fingerprint).await? {
        LookupOutcome::Ready(artifact) => LookupCachedResponse::Ready { artifact: artifact.into() },
        LookupOutcome::Miss => LookupCachedResponse::NotCached,
    };

    Ok(with_rate_limit_headers(body, rl_headers))
}

#[derive(Debug, Deserialize)]
pub struct BatchItem {
    pub video_ref: String,
    pub language: Option<String>,
    #[serde(default)]
    pub clean_flag: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitBatchRequest {
    pub items: Vec<BatchItem>,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct SubmitBatchResponse {
    pub queued: Vec<String>,
    pub cached: Vec<String>,
}

/// `submit_batch([video_ref], language, clean_flag, webhook_url?)` (§6).
/// Max 100 items; identical fingerprints within the batch are de-duplicated
/// so only the first reserves, matching the single-flight contract rather
/// than racing N reservations against the same lock.
pub async fn submit_batch(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SubmitBatchRequest>,
) -> ApiResult<Response> {
    if req.items.is_empty() {
        return Err(ApiError::bad_request("batch must contain at least one item"));
    }
    if req.items.len() > state.config.batch_max_items {
        return Err(ApiError::bad_request(format!(
            "batch exceeds max size of {}",
            state.config.batch_max_items
        )));
    }
    validate_webhook_url(req.webhook_url.as_deref())?;

    let principal = principal_from(&headers, Some(addr));
    let rl_headers = enforce_rate_limit(&state, &principal, "submit_batch").await?;

    let mut response = SubmitBatchResponse::default();
    let mut seen: HashSet<String> = HashSet::new();

    for item in req.items {
        validate_video_ref(&item.video_ref)?;
        validate_language(item.language.as_deref())?;
        let fingerprint = canonicalise(&item.video_ref, item.language.as_deref(), item.clean_flag)?;
        if !seen.insert(fingerprint.encode()) {
            continue;
        }

        match state.coordinator.lookup(&fingerprint).await? {
            LookupOutcome::Ready(_) => response.cached.push(fingerprint.encode()),
            LookupOutcome::Miss => match state.coordinator.reserve(&fingerprint, req.webhook_url.clone()).await? {
                ReserveOutcome::Leader(job_id) | ReserveOutcome::Follower(job_id) => {
                    response.queued.push(job_id.to_string())
                }
            },
        }
    }

    Ok(with_rate_limit_headers(response, rl_headers))
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: &'static str,
    pub enqueued_at: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub error: Option<String>,
    pub artifact: Option<ArtifactResponse>,
}

fn job_status_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Queued => "queued",
        JobStatus::Running => "running",
        JobStatus::Finished => "finished",
        JobStatus::Failed => "failed",
    }
}

/// `job_status(job_id) -> {status, enqueued_at, ended_at?, result?, error?}`
/// (§6). On `finished`, re-resolves the artifact through the coordinator
/// rather than carrying it on the job record itself.
pub async fn job_status(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Json<JobStatusResponse>> {
    let job = state
        .queue
        .fetch(&JobId::from(job_id.clone()))
        .await
        .map_err(|_| ApiError::not_found(format!("job {job_id}")))?;

    let artifact = if job.status == JobStatus::Finished {
        match state.coordinator.lookup(&job.fingerprint).await? {
            LookupOutcome::Ready(artifact) => Some(artifact.into()),
            LookupOutcome::Miss => None,
        }
    } else {
        None
    };

    Ok(Json(JobStatusResponse {
        job_id: job.job_id.to_string(),
        status: job_status_str(job.status),
        enqueued_at: job.enqueued_at.to_rfc3339(),
        started_at: job.started_at.map(|t| t.to_rfc3339()),
        ended_at: job.ended_at.map(|t| t.to_rfc3339()),
        error: job.error_kind.map(|k| k.as_str().to_string()),
        artifact,
    }))
}
