//! Durable FIFO job queue (C7): list-backed queue plus job record storage.

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::JobStore;
pub use queue::{JobQueue, QueueConfig};
