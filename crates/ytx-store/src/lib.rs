//! Tier-3 store (C4): Postgres-backed authoritative persistence.

pub mod config;
pub mod error;
pub mod rows;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::StoreClient;
