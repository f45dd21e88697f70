//! Builders to construct the scheduler from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::{build_queue, build_scheduler, build_scheduler_from_env};
