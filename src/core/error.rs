//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::DeploymentStatus;
use crate::util::serde::{ClusterId, DeploymentId, ResourceKind};

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No cluster with this identifier.
    #[error("cluster not found: {0}")]
    ClusterNotFound(ClusterId),
    /// No deployment with this identifier.
    #[error("deployment not found: {0}")]
    DeploymentNotFound(DeploymentId),
    /// Footprint exceeds the cluster's absolute limit and can never be admitted.
    #[error("unsatisfiable request: {kind} requires {required}, cluster limit is {limit}")]
    UnsatisfiableRequest {
        /// Offending dimension.
        kind: ResourceKind,
        /// Requested units.
        required: u64,
        /// Cluster limit for that dimension.
        limit: u64,
    },
    /// Allocation attempted without enough available capacity.
    #[error("insufficient capacity: {kind} requires {required}, available {available}")]
    InsufficientCapacity {
        /// Offending dimension.
        kind: ResourceKind,
        /// Requested units.
        required: u64,
        /// Units currently available.
        available: u64,
    },
    /// Release would push available capacity above the limit (double release).
    #[error("ledger corruption on cluster {cluster}: {kind} release of {released} would reach {would_be}, limit {limit}")]
    LedgerCorruption {
        /// Cluster whose ledger is inconsistent.
        cluster: ClusterId,
        /// Offending dimension.
        kind: ResourceKind,
        /// Units being returned.
        released: u64,
        /// Available value after the release.
        would_be: u64,
        /// Cluster limit for that dimension.
        limit: u64,
    },
    /// Deployment already present in the wait queue.
    #[error("duplicate wait-queue entry for deployment {0}")]
    DuplicateEntry(DeploymentId),
    /// Lifecycle transition not allowed by the state machine.
    #[error("deployment {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Deployment identifier.
        id: DeploymentId,
        /// Current status.
        from: DeploymentStatus,
        /// Requested status.
        to: DeploymentStatus,
    },
    /// Priority outside the supported range.
    #[error("invalid priority {0}: expected 1..=3")]
    InvalidPriority(u8),
    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

impl SchedulerError {
    /// Faults that indicate a scheduler bug rather than a bad request.
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::InsufficientCapacity { .. } | Self::LedgerCorruption { .. } | Self::Backend(_)
        )
    }
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
