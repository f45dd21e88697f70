//! Infrastructure adapters for wait queues and record stores.

pub mod queue;
pub mod store;

pub use queue::{FileWaitQueue, InMemoryWaitQueue, QueueBackend};
pub use store::InMemoryStore;
