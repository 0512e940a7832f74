//! Tier-1 (process-local) and Tier-2 (shared) caches for the ytx backend.
//!
//! These are the C2/C3 layers of the three-tier cache; they know nothing
//! about commit ordering or single-flight — that lives in the coordinator
//! crate one layer up.

pub mod config;
pub mod error;
pub mod tier1;
pub mod tier2;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use tier1::Tier1Cache;
pub use tier2::Tier2Cache;
