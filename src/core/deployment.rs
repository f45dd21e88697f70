//! Deployment record and lifecycle state machine.
//!
//! ```text
//! PENDING ──admit──▶ RUNNING ──complete/timeout──▶ COMPLETED
//!    │                  │
//!    └─────cancel───────┴──────cancel────────────▶ FAILED
//! ```
//!
//! Nothing re-enters PENDING and nothing leaves a terminal state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::ledger::Resources;
use crate::core::{SchedulerError, SchedulerResult};
use crate::util::serde::{ClusterId, DeploymentId, Priority};

/// Status of a deployment in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Waiting in the cluster's queue for capacity.
    Pending,
    /// Admitted; holds its footprint on the cluster.
    Running,
    /// Finished normally.
    Completed,
    /// Cancelled, before or after admission.
    Failed,
}

impl DeploymentStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Running, Self::Completed, Self::Failed];

    /// Completed and Failed are final.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine allows `self -> next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Failed)
                | (Self::Running, Self::Completed | Self::Failed)
        )
    }

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive fields the scheduler carries but never interprets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentMetadata {
    /// Human-readable name.
    pub name: String,
    /// Container image reference.
    pub image: String,
}

impl DeploymentMetadata {
    /// Build metadata from a name and image.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }
}

/// Persisted deployment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment identifier.
    pub id: DeploymentId,
    /// Owning cluster, fixed for the deployment's lifetime.
    pub cluster_id: ClusterId,
    /// Name and image.
    pub metadata: DeploymentMetadata,
    /// Resources held while running.
    pub footprint: Resources,
    /// Queue ordering class.
    pub priority: Priority,
    /// Current lifecycle status.
    pub status: DeploymentStatus,
    /// Creation time (ms since epoch).
    pub created_at_ms: u128,
    /// Admission time (ms since epoch).
    pub started_at_ms: Option<u128>,
    /// Time a terminal state was reached (ms since epoch).
    pub completed_at_ms: Option<u128>,
}

impl Deployment {
    /// Projection placed in the wait queue.
    pub const fn wait_entry(&self) -> WaitEntry {
        WaitEntry {
            deployment_id: self.id,
            footprint: self.footprint,
        }
    }

    fn transition(&mut self, next: DeploymentStatus) -> SchedulerResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(SchedulerError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// PENDING -> RUNNING.
    pub fn start(&mut self, now_ms: u128) -> SchedulerResult<()> {
        self.transition(DeploymentStatus::Running)?;
        self.started_at_ms = Some(now_ms);
        Ok(())
    }

    /// RUNNING -> COMPLETED.
    pub fn complete(&mut self, now_ms: u128) -> SchedulerResult<()> {
        self.transition(DeploymentStatus::Completed)?;
        self.completed_at_ms = Some(now_ms);
        Ok(())
    }

    /// PENDING or RUNNING -> FAILED.
    pub fn fail(&mut self, now_ms: u128) -> SchedulerResult<()> {
        self.transition(DeploymentStatus::Failed)?;
        self.completed_at_ms = Some(now_ms);
        Ok(())
    }

    /// Seconds between admission and completion, when both are known.
    #[allow(clippy::cast_precision_loss)]
    pub fn run_seconds(&self) -> Option<f64> {
        let started = self.started_at_ms?;
        let completed = self.completed_at_ms?;
        Some(completed.saturating_sub(started) as f64 / 1000.0)
    }
}

/// Fields needed to persist a new deployment; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeployment {
    /// Target cluster.
    pub cluster_id: ClusterId,
    /// Name and image.
    pub metadata: DeploymentMetadata,
    /// Requested resources.
    pub footprint: Resources,
    /// Queue ordering class.
    pub priority: Priority,
    /// Creation time (ms since epoch).
    pub created_at_ms: u128,
}

impl NewDeployment {
    /// Materialize as a PENDING record with the given id.
    pub fn into_pending(self, id: DeploymentId) -> Deployment {
        Deployment {
            id,
            cluster_id: self.cluster_id,
            metadata: self.metadata,
            footprint: self.footprint,
            priority: self.priority,
            status: DeploymentStatus::Pending,
            created_at_ms: self.created_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
        }
    }
}

/// Wait-queue projection of a PENDING deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitEntry {
    /// Deployment identifier.
    pub deployment_id: DeploymentId,
    /// Requested resources.
    pub footprint: Resources,
}
