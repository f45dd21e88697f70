//! In-memory record store.
//!
//! A single mutex guards clusters and deployments together, which makes
//! [`SchedulerStore::commit`] atomic for free.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{
    Cluster, Deployment, NewDeployment, Resources, SchedulerError, SchedulerResult, SchedulerStore,
};
use crate::util::serde::{ClusterId, DeploymentId, OrganizationId};

#[derive(Debug, Default)]
struct StoreState {
    clusters: BTreeMap<ClusterId, Cluster>,
    deployments: BTreeMap<DeploymentId, Deployment>,
    last_cluster_id: ClusterId,
    last_deployment_id: DeploymentId,
}

/// In-memory store for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a deployment without any checks. Lets tests and repair
    /// tooling simulate records that drifted from the wait queue.
    pub fn put_deployment(&self, deployment: Deployment) {
        self.state.lock().deployments.insert(deployment.id, deployment);
    }
}

#[async_trait]
impl SchedulerStore for InMemoryStore {
    async fn insert_cluster(
        &self,
        organization_id: OrganizationId,
        name: String,
        limits: Resources,
    ) -> SchedulerResult<Cluster> {
        let mut state = self.state.lock();
        state.last_cluster_id += 1;
        let cluster = Cluster::new(state.last_cluster_id, organization_id, name, limits);
        state.clusters.insert(cluster.id, cluster.clone());
        Ok(cluster)
    }

    async fn get_cluster(&self, id: ClusterId) -> SchedulerResult<Option<Cluster>> {
        Ok(self.state.lock().clusters.get(&id).cloned())
    }

    async fn list_clusters(
        &self,
        organization_id: Option<OrganizationId>,
    ) -> SchedulerResult<Vec<Cluster>> {
        Ok(self
            .state
            .lock()
            .clusters
            .values()
            .filter(|c| organization_id.is_none_or(|org| c.organization_id == org))
            .cloned()
            .collect())
    }

    async fn insert_deployment(&self, new: NewDeployment) -> SchedulerResult<Deployment> {
        let mut state = self.state.lock();
        if !state.clusters.contains_key(&new.cluster_id) {
            return Err(SchedulerError::ClusterNotFound(new.cluster_id));
        }
        state.last_deployment_id += 1;
        let deployment = new.into_pending(state.last_deployment_id);
        state.deployments.insert(deployment.id, deployment.clone());
        Ok(deployment)
    }

    async fn get_deployment(&self, id: DeploymentId) -> SchedulerResult<Option<Deployment>> {
        Ok(self.state.lock().deployments.get(&id).cloned())
    }

    async fn list_deployments(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<Deployment>> {
        Ok(self
            .state
            .lock()
            .deployments
            .values()
            .filter(|d| d.cluster_id == cluster_id)
            .cloned()
            .collect())
    }

    async fn update_deployment(&self, deployment: &Deployment) -> SchedulerResult<()> {
        let mut state = self.state.lock();
        match state.deployments.get_mut(&deployment.id) {
            Some(slot) => {
                *slot = deployment.clone();
                Ok(())
            }
            None => Err(SchedulerError::DeploymentNotFound(deployment.id)),
        }
    }

    async fn commit(&self, cluster: &Cluster, deployment: &Deployment) -> SchedulerResult<()> {
        if deployment.cluster_id != cluster.id {
            return Err(SchedulerError::Backend(format!(
                "deployment {} belongs to cluster {}, not {}",
                deployment.id, deployment.cluster_id, cluster.id
            )));
        }
        let mut state = self.state.lock();
        if !state.clusters.contains_key(&cluster.id) {
            return Err(SchedulerError::ClusterNotFound(cluster.id));
        }
        if !state.deployments.contains_key(&deployment.id) {
            return Err(SchedulerError::DeploymentNotFound(deployment.id));
        }
        state.clusters.insert(cluster.id, cluster.clone());
        state.deployments.insert(deployment.id, deployment.clone());
        Ok(())
    }
}
