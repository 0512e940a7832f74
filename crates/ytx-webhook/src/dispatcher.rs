//! Signed delivery with the fixed retry schedule from §4.10: attempts at
//! 0s, 1s, 2s after the previous one (three attempts total), any non-2xx
//! or transport error counts as a failed attempt.

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};
use ytx_models::{Artifact, JobRecord, WebhookDeliveryStatus};

use crate::config::WebhookConfig;
use crate::error::{WebhookError, WebhookResult};
use crate::payload::WebhookPayload;
use crate::signing;

const RETRY_SCHEDULE: [Duration; 3] = [Duration::ZERO, Duration::from_secs(1), Duration::from_secs(2)];

pub struct WebhookDispatcher {
    client: Client,
    config: WebhookConfig,
}

pub struct DeliveryOutcome {
    pub status: WebhookDeliveryStatus,
    pub attempts: u32,
}

impl WebhookDispatcher {
    pub fn new(config: WebhookConfig) -> WebhookResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Deliver the payload for `job` to `job.webhook_url`, retrying on the
    /// fixed schedule. Returns the final delivery status; never returns
    /// `Err` for a retriable failure, only for configuration problems
    /// (missing url / bad secret / JSON encoding).
    pub async fn dispatch(&self, job: &JobRecord, artifact: Option<&Artifact>) -> WebhookResult<DeliveryOutcome> {
        let Some(url) = job.webhook_url.as_deref() else {
            return Ok(DeliveryOutcome { status: WebhookDeliveryStatus::None, attempts: 0 });
        };

        let payload = WebhookPayload::for_job(job, artifact);
        let body = payload.to_json_bytes()?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = signing::sign(&self.config.secret, &body, &timestamp)?;

        let max_attempts = self.config.max_retries.max(1).min(RETRY_SCHEDULE.len() as u32);
        let mut last_err: Option<WebhookError> = None;

        for attempt in 0..max_attempts {
            if !RETRY_SCHEDULE[attempt as usize].is_zero() {
                tokio::time::sleep(RETRY_SCHEDULE[attempt as usize]).await;
            }

            match self.send_once(url, &body, &timestamp, &signature).await {
                Ok(()) => {
                    info!(job_id = %job.job_id, attempt, "webhook delivered");
                    metrics::counter!("ytx_webhook_delivered_total").increment(1);
                    return Ok(DeliveryOutcome {
                        status: WebhookDeliveryStatus::Delivered,
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    warn!(job_id = %job.job_id, attempt, error = %e, "webhook delivery attempt failed");
                    last_err = Some(e);
                }
            }
        }

        metrics::counter!("ytx_webhook_failed_total").increment(1);
        let final_err = last_err.unwrap_or(WebhookError::AllAttemptsFailed(max_attempts));
        warn!(job_id = %job.job_id, error = %final_err, "webhook delivery exhausted retry schedule");
        Ok(DeliveryOutcome { status: WebhookDeliveryStatus::Failed, attempts: max_attempts })
    }

    async fn send_once(&self, url: &str, body: &[u8], timestamp: &str, signature: &str) -> WebhookResult<()> {
        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .header("X-Webhook-Timestamp", timestamp)
            .header("X-Webhook-Signature", signature)
            .body(body.to_vec())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(WebhookError::NonSuccessStatus(response.status().as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use ytx_models::Fingerprint;

    fn fp() -> Fingerprint {
        Fingerprint::canonicalise("dQw4w9WgXcQ", None, None).unwrap()
    }

    fn config() -> WebhookConfig {
        WebhookConfig { timeout: Duration::from_secs(5), max_retries: 3, secret: "s3cr3t".into() }
    }

    #[tokio::test]
    async fn delivers_on_first_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header_exists("x-webhook-signature"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut job = JobRecord::new(fp(), Some(format!("{}/hook", server.uri())));
        job.mark_running();
        job.mark_finished();

        let dispatcher = WebhookDispatcher::new(config()).unwrap();
        let outcome = dispatcher.dispatch(&job, None).await.unwrap();
        assert_eq!(outcome.status, WebhookDeliveryStatus::Delivered);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut job = JobRecord::new(fp(), Some(format!("{}/hook", server.uri())));
        job.mark_running();
        job.mark_finished();

        let dispatcher = WebhookDispatcher::new(config()).unwrap();
        let outcome = dispatcher.dispatch(&job, None).await.unwrap();
        assert_eq!(outcome.status, WebhookDeliveryStatus::Delivered);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn exhausts_schedule_and_reports_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).and(path("/hook")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

        let mut job = JobRecord::new(fp(), Some(format!("{}/hook", server.uri())));
        job.mark_running();
        job.mark_finished();

        let dispatcher = WebhookDispatcher::new(config()).unwrap();
        let outcome = dispatcher.dispatch(&job, None).await.unwrap();
        assert_eq!(outcome.status, WebhookDeliveryStatus::Failed);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn no_webhook_url_is_a_noop() {
        let mut job = JobRecord::new(fp(), None);
        job.mark_running();
        job.mark_finished();

        let dispatcher = WebhookDispatcher::new(config()).unwrap();
        let outcome = dispatcher.dispatch(&job, None).await.unwrap();
        assert_eq!(outcome.status, WebhookDeliveryStatus::None);
    }
}
