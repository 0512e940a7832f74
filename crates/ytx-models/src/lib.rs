//! Shared data models for the ytx transcript extraction backend.
//!
//! This crate provides the value types shared across every other crate:
//! the fingerprint (the sole cache key), the artifact (a committed
//! extraction result), the job record (lifecycle state for a single
//! extraction request), the shared error taxonomy, and the rate-limit
//! bucket shape.

pub mod artifact;
pub mod error_kind;
pub mod fingerprint;
pub mod job;
pub mod rate_limit;

pub use artifact::{clean_segments, compute_integrity, Artifact, Engine, Segment};
pub use error_kind::ErrorKind;
pub use fingerprint::{extract_video_id, Fingerprint, FingerprintError, FingerprintResult};
pub use job::{JobId, JobRecord, JobStatus, WebhookDeliveryStatus};
pub use rate_limit::{RateLimitBucket, RateLimitOutcome};
