//! Signed webhook dispatcher (C10): HMAC-SHA256 signed delivery with a
//! fixed 0s/1s/2s retry schedule.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod signing;

pub use config::WebhookConfig;
pub use dispatcher::{DeliveryOutcome, WebhookDispatcher};
pub use error::{WebhookError, WebhookResult};
pub use payload::{ErrorSummary, ResultSummary, WebhookPayload};
