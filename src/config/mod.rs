//! Configuration models for the scheduler, its queue backend and timeouts.

pub mod scheduler;

pub use scheduler::{QueueBackendConfig, SchedulerConfig};
