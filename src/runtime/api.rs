//! API-facing request/response models.
//!
//! Thin adapters for whatever transport sits in front of the scheduler. They
//! only read scheduler state or forward to scheduler operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{
    Cluster, Deployment, DeploymentMetadata, DeploymentScheduler, DeploymentStatus, Resources,
    SchedulerResult, SchedulerStore, Spawn, WaitQueue,
};
use crate::util::serde::{ClusterId, OrganizationId, Priority, ResourceKind};

/// Deployment creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeploymentRequest {
    /// Target cluster.
    pub cluster_id: ClusterId,
    /// Deployment name.
    pub name: String,
    /// Container image.
    pub image: String,
    /// CPU units required.
    pub cpu_required: u64,
    /// RAM units required.
    pub ram_required: u64,
    /// GPU units required.
    pub gpu_required: u64,
    /// Priority class, 1..=3.
    #[serde(default)]
    pub priority: Priority,
}

impl CreateDeploymentRequest {
    /// Requested footprint.
    pub const fn footprint(&self) -> Resources {
        Resources::new(self.cpu_required, self.ram_required, self.gpu_required)
    }
}

/// Cluster ledger view for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Cluster identifier.
    pub id: ClusterId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Display name.
    pub name: String,
    /// Absolute limits.
    pub limits: Resources,
    /// Unallocated capacity.
    pub available: Resources,
    /// Allocated fraction per dimension (0.0 when the limit is zero).
    pub utilisation: BTreeMap<String, f64>,
}

impl From<&Cluster> for ClusterSnapshot {
    #[allow(clippy::cast_precision_loss)]
    fn from(cluster: &Cluster) -> Self {
        let limits = cluster.limits();
        let allocated = cluster.allocated();
        let utilisation = ResourceKind::ALL
            .into_iter()
            .map(|kind| {
                let limit = limits.get(kind);
                let used = if limit == 0 {
                    0.0
                } else {
                    allocated.get(kind) as f64 / limit as f64
                };
                (kind.to_string(), used)
            })
            .collect();
        Self {
            id: cluster.id,
            organization_id: cluster.organization_id,
            name: cluster.name.clone(),
            limits,
            available: cluster.available(),
            utilisation,
        }
    }
}

/// Aggregate deployment statistics for an organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentStats {
    /// Number of deployments.
    pub total_deployments: usize,
    /// Count per status name.
    pub status_distribution: BTreeMap<String, usize>,
    /// Count per priority score.
    pub priority_distribution: BTreeMap<u8, usize>,
    /// Mean run time of completed deployments, in seconds.
    pub average_completion_time_seconds: Option<f64>,
    /// RUNNING deployments.
    pub active_deployments: usize,
    /// PENDING deployments.
    pub pending_deployments: usize,
}

impl DeploymentStats {
    /// Aggregate a set of deployment records.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_deployments<'a>(deployments: impl IntoIterator<Item = &'a Deployment>) -> Self {
        let mut stats = Self {
            status_distribution: DeploymentStatus::ALL
                .into_iter()
                .map(|s| (s.as_str().to_string(), 0))
                .collect(),
            ..Self::default()
        };
        let mut run_total = 0.0;
        let mut run_count = 0usize;
        for d in deployments {
            stats.total_deployments += 1;
            *stats
                .status_distribution
                .entry(d.status.as_str().to_string())
                .or_default() += 1;
            *stats.priority_distribution.entry(d.priority.score()).or_default() += 1;
            match d.status {
                DeploymentStatus::Running => stats.active_deployments += 1,
                DeploymentStatus::Pending => stats.pending_deployments += 1,
                DeploymentStatus::Completed => {
                    if let Some(secs) = d.run_seconds() {
                        run_total += secs;
                        run_count += 1;
                    }
                }
                DeploymentStatus::Failed => {}
            }
        }
        if run_count > 0 {
            stats.average_completion_time_seconds = Some(run_total / run_count as f64);
        }
        stats
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Create a deployment from an API payload.
pub async fn submit_deployment<S, Q, D>(
    scheduler: &DeploymentScheduler<S, Q, D>,
    req: CreateDeploymentRequest,
) -> SchedulerResult<Deployment>
where
    S: SchedulerStore,
    Q: WaitQueue,
    D: Spawn + Send + Sync + 'static,
{
    let footprint = req.footprint();
    scheduler
        .create_deployment(
            req.cluster_id,
            footprint,
            req.priority,
            DeploymentMetadata::new(req.name, req.image),
        )
        .await
}

/// Ledger snapshots for an organization's clusters.
pub async fn list_clusters<S, Q, D>(
    scheduler: &DeploymentScheduler<S, Q, D>,
    organization_id: OrganizationId,
) -> SchedulerResult<Vec<ClusterSnapshot>>
where
    S: SchedulerStore,
    Q: WaitQueue,
    D: Spawn + Send + Sync + 'static,
{
    Ok(scheduler
        .list_clusters(Some(organization_id))
        .await?
        .iter()
        .map(ClusterSnapshot::from)
        .collect())
}

/// Statistics over every deployment on an organization's clusters.
pub async fn deployment_stats<S, Q, D>(
    scheduler: &DeploymentScheduler<S, Q, D>,
    organization_id: OrganizationId,
) -> SchedulerResult<DeploymentStats>
where
    S: SchedulerStore,
    Q: WaitQueue,
    D: Spawn + Send + Sync + 'static,
{
    let mut deployments = Vec::new();
    for cluster in scheduler.list_clusters(Some(organization_id)).await? {
        deployments.extend(scheduler.list_deployments(cluster.id).await?);
    }
    Ok(DeploymentStats::from_deployments(&deployments))
}

/// Return a health payload.
pub const fn health() -> Health {
    Health { ok: true }
}
