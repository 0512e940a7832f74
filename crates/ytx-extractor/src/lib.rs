//! Dual-engine extractor (C8): primary/fallback engines, proxy rotation,
//! exponential-backoff-with-full-jitter attempt ladder.

pub mod backoff;
pub mod config;
pub mod engine;
pub mod error;
pub mod ladder;
pub mod proxy;

pub use backoff::BackoffPolicy;
pub use config::ExtractorConfig;
pub use engine::{FallbackEngine, PrimaryEngine, RawTranscript};
pub use error::{ExtractorError, ExtractorResult};
pub use ladder::Extractor;
pub use proxy::{ProxyDescriptor, ProxyPoolHealth, ProxyRotator};
