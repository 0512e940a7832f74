//! The attempt ladder (§4.8): primary direct → primary+proxy → fallback
//! direct → fallback+proxy, with exponential backoff and full jitter between
//! attempts and a bounded overall wall-clock budget.

use std::time::{Duration, Instant};

use tracing::{info, warn};
use ytx_models::{Artifact, Engine, Fingerprint};

use crate::backoff::BackoffPolicy;
use crate::config::ExtractorConfig;
use crate::engine::{FallbackEngine, PrimaryEngine, RawTranscript};
use crate::error::{ExtractorError, ExtractorResult};
use crate::proxy::ProxyRotator;

enum Strategy {
    PrimaryDirect,
    PrimaryProxy,
    FallbackDirect,
    FallbackProxy,
}

pub struct Extractor {
    primary: PrimaryEngine,
    fallback: FallbackEngine,
    rotator: ProxyRotator,
    config: ExtractorConfig,
    backoff: BackoffPolicy,
}

impl Extractor {
    pub fn new(primary: PrimaryEngine, fallback: FallbackEngine, rotator: ProxyRotator, config: ExtractorConfig) -> Self {
        let backoff = BackoffPolicy::new(config.backoff_base, config.backoff_cap);
        Self { primary, fallback, rotator, config, backoff }
    }

    pub fn rotator(&self) -> &ProxyRotator {
        &self.rotator
    }

    /// Runs the full ladder for a single fingerprint, producing a committed
    /// [`Artifact`] or a terminal [`ExtractorError`].
    pub async fn extract(&self, fingerprint: &Fingerprint) -> ExtractorResult<Artifact> {
        let overall = tokio::time::timeout(self.config.extraction_timeout, self.run_ladder(fingerprint)).await;

        match overall {
            Ok(result) => result,
            Err(_) => Err(ExtractorError::UpstreamTransient("extraction deadline exceeded".to_string())),
        }
    }

    async fn run_ladder(&self, fingerprint: &Fingerprint) -> ExtractorResult<Artifact> {
        let started = Instant::now();
        let steps = [Strategy::PrimaryDirect, Strategy::PrimaryProxy, Strategy::FallbackDirect, Strategy::FallbackProxy];

        let mut last_error = ExtractorError::Internal("ladder produced no attempts".to_string());

        for (attempt, step) in steps.iter().enumerate().take(self.config.extraction_max_attempts as usize) {
            if attempt > 0 {
                let delay = self.backoff.delay_for_attempt(attempt as u32 - 1);
                tokio::time::sleep(delay).await;
            }

            let uses_proxy = matches!(step, Strategy::PrimaryProxy | Strategy::FallbackProxy);
            let proxy = if uses_proxy { self.rotator.select() } else { None };
            if uses_proxy && proxy.is_none() {
                info!(attempt, "skipping proxy attempt, no proxy available");
                continue;
            }

            let remaining = self.config.extraction_timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }

            let engine_used = match step {
                Strategy::PrimaryDirect | Strategy::PrimaryProxy => Engine::Primary,
                Strategy::FallbackDirect | Strategy::FallbackProxy => Engine::Fallback,
            };

            let result = self.attempt(step, fingerprint, proxy.as_ref(), remaining).await;

            match result {
                Ok(raw) => {
                    if let Some(p) = &proxy {
                        self.rotator.record_success(&p.endpoint);
                    }
                    metrics::histogram!("ytx_extraction_duration_ms").record(started.elapsed().as_millis() as f64);
                    return Ok(Artifact::new(
                        fingerprint.clone(),
                        raw.title,
                        engine_used,
                        raw.segments,
                        started.elapsed().as_millis() as u64,
                        chrono::Duration::seconds(3600),
                    ));
                }
                Err(e) if e.is_permanent() => {
                    return Err(e);
                }
                Err(e) => {
                    if let Some(p) = &proxy {
                        self.rotator.record_failure(&p.endpoint);
                    }
                    warn!(attempt, error = %e, "ladder attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn attempt(
        &self,
        step: &Strategy,
        fingerprint: &Fingerprint,
        proxy: Option<&crate::proxy::ProxyDescriptor>,
        timeout: Duration,
    ) -> ExtractorResult<RawTranscript> {
        match step {
            Strategy::PrimaryDirect | Strategy::PrimaryProxy => {
                self.primary.fetch(&fingerprint.video_id, &fingerprint.language, proxy, timeout).await
            }
            Strategy::FallbackDirect | Strategy::FallbackProxy => {
                self.fallback.fetch(&fingerprint.video_id, &fingerprint.language, proxy, timeout).await
            }
        }
    }
}
