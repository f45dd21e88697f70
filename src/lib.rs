//! # Cluster Parking Lot
//!
//! A resource-aware deployment scheduler for capacity-limited clusters.
//!
//! Each cluster has a finite CPU/RAM/GPU budget. Deployments declare a
//! footprint and a priority class. Those that fit are admitted straight away.
//! The rest park in a per-cluster wait queue until a release frees enough
//! capacity, and then the queue is drained again in priority order.
//!
//! ## Core Guarantees
//!
//! - **No over-commit**: `0 <= available <= limit` on every dimension, always.
//!   A release that would exceed a limit is reported as ledger corruption,
//!   never clamped.
//! - **Queue/status bijection**: every PENDING deployment has exactly one
//!   wait-queue entry and every entry belongs to a PENDING deployment. Stale
//!   entries are dropped by the admission pass; missing ones are restored by
//!   reconciliation.
//! - **Strict priority**: higher priority first, enqueue order within a
//!   priority. The head of the queue blocks everything behind it until it
//!   fits (head-of-line blocking).
//! - **Cascade**: every release (cancel, completion, timeout) re-runs
//!   admission on the same cluster within the same operation.
//! - **Per-cluster serialization**: ledger, queue and status mutations for one
//!   cluster are mutually exclusive; clusters never wait on each other.
//!
//! ## Lifecycle
//!
//! `PENDING -> RUNNING -> {COMPLETED, FAILED}` and `PENDING -> FAILED`.
//! A RUNNING deployment is completed by [`DeploymentScheduler::complete_deployment`]
//! or, failing that, by the timeout reaper once the configured timeout elapses.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cluster_parking_lot::core::{DeploymentMetadata, DeploymentScheduler, Resources, SchedulerOptions};
//! use cluster_parking_lot::infra::{InMemoryStore, InMemoryWaitQueue};
//! use cluster_parking_lot::runtime::TokioSpawner;
//! use cluster_parking_lot::util::Priority;
//!
//! let scheduler = DeploymentScheduler::new(
//!     InMemoryStore::new(),
//!     InMemoryWaitQueue::new(),
//!     TokioSpawner::current(),
//!     SchedulerOptions::default(),
//! );
//!
//! let cluster = scheduler.register_cluster(1, "gpu-a", Resources::new(16, 64, 4)).await?;
//! let d = scheduler
//!     .create_deployment(
//!         cluster.id,
//!         Resources::new(4, 16, 1),
//!         Priority::High,
//!         DeploymentMetadata::new("llm", "ghcr.io/acme/llm:1"),
//!     )
//!     .await?;
//! scheduler.cancel_deployment(d.id).await?;
//! ```
//!
//! For complete scenarios see `tests/scheduler_algorithm_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions and capacity accounting.
pub mod core;
/// Configuration models for the scheduler and its backends.
pub mod config;
/// Builders to construct the scheduler from configuration.
pub mod builders;
/// Infrastructure adapters for wait queues and record stores.
pub mod infra;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{
    Cluster, Deployment, DeploymentMetadata, DeploymentScheduler, DeploymentStatus, Resources,
    SchedulerError, SchedulerOptions, SchedulerResult,
};
