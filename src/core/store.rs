//! Contracts for the scheduler's external collaborators.
//!
//! The scheduler owns no storage. It talks to a relational-style record
//! store, a priority-indexed wait queue scoped per cluster, and a runtime
//! that can run a future after a delay. Implementations live in
//! [`crate::infra`] and [`crate::runtime`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::deployment::{Deployment, NewDeployment, WaitEntry};
use crate::core::ledger::{Cluster, Resources};
use crate::core::SchedulerResult;
use crate::util::serde::{ClusterId, DeploymentId, OrganizationId, Priority};

/// Persistence for cluster ledgers and deployment records.
#[async_trait]
pub trait SchedulerStore: Send + Sync + 'static {
    /// Persist a new cluster with `available = limits` and return it.
    async fn insert_cluster(
        &self,
        organization_id: OrganizationId,
        name: String,
        limits: Resources,
    ) -> SchedulerResult<Cluster>;

    /// Load a cluster ledger.
    async fn get_cluster(&self, id: ClusterId) -> SchedulerResult<Option<Cluster>>;

    /// List clusters, optionally restricted to one organization.
    async fn list_clusters(
        &self,
        organization_id: Option<OrganizationId>,
    ) -> SchedulerResult<Vec<Cluster>>;

    /// Persist a PENDING deployment, assigning its id.
    async fn insert_deployment(&self, new: NewDeployment) -> SchedulerResult<Deployment>;

    /// Load a deployment record.
    async fn get_deployment(&self, id: DeploymentId) -> SchedulerResult<Option<Deployment>>;

    /// All deployments owned by a cluster.
    async fn list_deployments(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<Deployment>>;

    /// Overwrite a deployment record that does not affect the ledger.
    async fn update_deployment(&self, deployment: &Deployment) -> SchedulerResult<()>;

    /// Write a ledger change and the deployment transition that caused it as
    /// one unit: either both are visible afterwards or neither is.
    async fn commit(&self, cluster: &Cluster, deployment: &Deployment) -> SchedulerResult<()>;
}

/// Priority-indexed collection of waiting deployments, keyed by cluster.
///
/// Entries with a higher score come out first; equal scores come out in
/// enqueue order.
#[async_trait]
pub trait WaitQueue: Send + Sync + 'static {
    /// Insert an entry. Fails with `DuplicateEntry` if the deployment is
    /// already queued.
    async fn enqueue(
        &self,
        cluster_id: ClusterId,
        entry: WaitEntry,
        priority: Priority,
    ) -> SchedulerResult<()>;

    /// Highest-priority entry, without removing it.
    async fn peek_highest(&self, cluster_id: ClusterId) -> SchedulerResult<Option<WaitEntry>>;

    /// Remove an entry. Returns whether it was present; absent is not an error.
    async fn remove(&self, cluster_id: ClusterId, deployment_id: DeploymentId)
        -> SchedulerResult<bool>;

    /// Every queued entry, in admission order.
    async fn entries(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<WaitEntry>>;
}

/// Deferred-execution facility used by the timeout reaper.
pub trait Spawn {
    /// Run a future in the background once `delay` has elapsed.
    ///
    /// Firing at least once is enough; callers guard their action.
    fn spawn_after<F>(&self, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
