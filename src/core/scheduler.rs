//! Deployment scheduler: admission, release, cascade and timeout reaping.
//!
//! Every mutation of a cluster's ledger, its wait queue, or the status of a
//! deployment it owns happens inside that cluster's serialization domain, an
//! async mutex keyed by cluster id. Different clusters never contend.
//!
//! Admission is strict priority with head-of-line blocking: a pass stops at
//! the first queued request that does not fit, even when smaller requests
//! behind it would. A large high-priority request can therefore hold back
//! every lower-priority request on its cluster until capacity frees up.
//!
//! The timeout reaper is the fallback that eventually completes every running
//! deployment. It is never cancelled; when it fires it re-reads the status and
//! does nothing unless the deployment is still RUNNING.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::deployment::{Deployment, DeploymentMetadata, DeploymentStatus, NewDeployment};
use crate::core::ledger::{Cluster, Resources};
use crate::core::store::{SchedulerStore, Spawn, WaitQueue};
use crate::core::{SchedulerError, SchedulerResult};
use crate::util::clock::{now_ms, remaining};
use crate::util::serde::{ClusterId, DeploymentId, OrganizationId, Priority};

/// Default upper bound on how long a deployment stays RUNNING.
pub const DEFAULT_DEPLOYMENT_TIMEOUT: Duration = Duration::from_secs(300);

type ReaperFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Tunables for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Time after admission at which the reaper completes a deployment.
    pub deployment_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            deployment_timeout: DEFAULT_DEPLOYMENT_TIMEOUT,
        }
    }
}

/// Outcome of [`DeploymentScheduler::reconcile_cluster`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Cluster that was reconciled.
    pub cluster_id: ClusterId,
    /// PENDING deployments that were missing from the queue.
    pub enqueued: Vec<DeploymentId>,
    /// Queue entries whose deployment was not PENDING.
    pub dropped: Vec<DeploymentId>,
    /// Deployments admitted by the follow-up pass.
    pub admitted: Vec<DeploymentId>,
}

/// How a running deployment is concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conclusion {
    Completed,
    Failed,
}

struct Inner<S, Q, D> {
    store: S,
    queue: Q,
    spawner: D,
    options: SchedulerOptions,
    domains: Mutex<HashMap<ClusterId, Arc<AsyncMutex<()>>>>,
    audit: Mutex<Option<Box<dyn AuditSink>>>,
}

/// Resource-aware deployment scheduler.
///
/// Cheap to clone; clones share state.
pub struct DeploymentScheduler<S, Q, D> {
    inner: Arc<Inner<S, Q, D>>,
}

impl<S, Q, D> Clone for DeploymentScheduler<S, Q, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, Q, D> DeploymentScheduler<S, Q, D> {
    /// Create a scheduler over the given collaborators.
    pub fn new(store: S, queue: Q, spawner: D, options: SchedulerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                queue,
                spawner,
                options,
                domains: Mutex::new(HashMap::new()),
                audit: Mutex::new(None),
            }),
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(self, audit: Box<dyn AuditSink>) -> Self {
        *self.inner.audit.lock() = Some(audit);
        self
    }

    /// Scheduler tunables.
    pub fn options(&self) -> &SchedulerOptions {
        &self.inner.options
    }

    /// Underlying record store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Underlying wait queue.
    pub fn queue(&self) -> &Q {
        &self.inner.queue
    }

    /// Number of clusters that have a serialization domain.
    pub fn domain_count(&self) -> usize {
        self.inner.domains.lock().len()
    }

    fn record(
        &self,
        cluster_id: ClusterId,
        deployment: Option<&Deployment>,
        action: AuditAction,
        payload: Option<String>,
    ) {
        if let Some(sink) = self.inner.audit.lock().as_mut() {
            sink.record(build_audit_event(
                cluster_id,
                deployment.map(|d| d.id),
                action,
                deployment.map(|d| d.status),
                payload,
            ));
        }
    }
}

impl<S, Q, D> DeploymentScheduler<S, Q, D>
where
    S: SchedulerStore,
    Q: WaitQueue,
    D: Spawn + Send + Sync + 'static,
{
    /// Serialization domain of an existing cluster.
    ///
    /// Unknown ids fail with `ClusterNotFound` and leave the map untouched.
    async fn domain(&self, cluster_id: ClusterId) -> SchedulerResult<Arc<AsyncMutex<()>>> {
        let existing = self.inner.domains.lock().get(&cluster_id).cloned();
        if let Some(domain) = existing {
            return Ok(domain);
        }
        self.get_cluster(cluster_id).await?;
        Ok(Arc::clone(
            self.inner.domains.lock().entry(cluster_id).or_default(),
        ))
    }

    /// Create a cluster whose capacity is entirely available.
    pub async fn register_cluster(
        &self,
        organization_id: OrganizationId,
        name: impl Into<String> + Send,
        limits: Resources,
    ) -> SchedulerResult<Cluster> {
        let cluster = self
            .inner
            .store
            .insert_cluster(organization_id, name.into(), limits)
            .await?;
        tracing::info!(
            cluster = cluster.id,
            organization = organization_id,
            cpu = limits.cpu,
            ram = limits.ram,
            gpu = limits.gpu,
            "cluster registered"
        );
        Ok(cluster)
    }

    /// Read a cluster's ledger.
    pub async fn get_cluster(&self, cluster_id: ClusterId) -> SchedulerResult<Cluster> {
        self.inner
            .store
            .get_cluster(cluster_id)
            .await?
            .ok_or(SchedulerError::ClusterNotFound(cluster_id))
    }

    /// Read every cluster ledger, optionally for one organization.
    pub async fn list_clusters(
        &self,
        organization_id: Option<OrganizationId>,
    ) -> SchedulerResult<Vec<Cluster>> {
        self.inner.store.list_clusters(organization_id).await
    }

    /// Read a deployment.
    pub async fn get_deployment(&self, deployment_id: DeploymentId) -> SchedulerResult<Deployment> {
        self.inner
            .store
            .get_deployment(deployment_id)
            .await?
            .ok_or(SchedulerError::DeploymentNotFound(deployment_id))
    }

    /// Every deployment owned by a cluster.
    pub async fn list_deployments(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<Deployment>> {
        self.inner.store.list_deployments(cluster_id).await
    }

    /// Persist a PENDING deployment, queue it and run an admission pass.
    ///
    /// The returned record reflects the pass, so it is RUNNING if it was
    /// admitted straight away.
    pub async fn create_deployment(
        &self,
        cluster_id: ClusterId,
        footprint: Resources,
        priority: Priority,
        metadata: DeploymentMetadata,
    ) -> SchedulerResult<Deployment> {
        let domain = self.domain(cluster_id).await?;
        let _guard = domain.lock().await;

        let cluster = self.get_cluster(cluster_id).await?;
        if let Err(e) = cluster.check_satisfiable(&footprint) {
            tracing::warn!(cluster = cluster_id, error = %e, "deployment rejected");
            self.record(cluster_id, None, AuditAction::Reject, Some(e.to_string()));
            return Err(e);
        }

        let mut deployment = self
            .inner
            .store
            .insert_deployment(NewDeployment {
                cluster_id,
                metadata,
                footprint,
                priority,
                created_at_ms: now_ms(),
            })
            .await?;

        if let Err(e) = self
            .inner
            .queue
            .enqueue(cluster_id, deployment.wait_entry(), priority)
            .await
        {
            tracing::error!(deployment = deployment.id, error = %e, "enqueue failed; failing deployment");
            deployment.fail(now_ms())?;
            if let Err(update_err) = self.inner.store.update_deployment(&deployment).await {
                tracing::error!(deployment = deployment.id, error = %update_err, "could not persist failed status");
            }
            return Err(e);
        }
        tracing::info!(
            deployment = deployment.id,
            cluster = cluster_id,
            priority = %priority,
            "deployment queued"
        );
        self.record(cluster_id, Some(&deployment), AuditAction::Enqueue, None);

        self.pass_logged(cluster_id).await;
        self.get_deployment(deployment.id).await
    }

    /// Cancel a deployment.
    ///
    /// PENDING leaves the queue, RUNNING releases its footprint and cascades.
    /// Either way it ends FAILED. Terminal deployments are returned unchanged.
    pub async fn cancel_deployment(&self, deployment_id: DeploymentId) -> SchedulerResult<Deployment> {
        let cluster_id = self.get_deployment(deployment_id).await?.cluster_id;
        let domain = self.domain(cluster_id).await?;
        let _guard = domain.lock().await;

        let mut deployment = self.get_deployment(deployment_id).await?;
        match deployment.status {
            DeploymentStatus::Pending => {
                deployment.fail(now_ms())?;
                self.inner.store.update_deployment(&deployment).await?;
                if let Err(e) = self.inner.queue.remove(cluster_id, deployment_id).await {
                    tracing::warn!(deployment = deployment_id, error = %e, "queue removal failed; entry will be healed");
                }
                tracing::info!(deployment = deployment_id, cluster = cluster_id, "pending deployment cancelled");
                self.record(cluster_id, Some(&deployment), AuditAction::Cancel, None);
                // The cancelled entry may have been blocking the head of the queue.
                self.pass_logged(cluster_id).await;
            }
            DeploymentStatus::Running => {
                self.conclude_locked(&mut deployment, Conclusion::Failed).await?;
                tracing::info!(deployment = deployment_id, cluster = cluster_id, "running deployment cancelled");
                self.record(cluster_id, Some(&deployment), AuditAction::Cancel, None);
                self.pass_logged(cluster_id).await;
            }
            DeploymentStatus::Completed | DeploymentStatus::Failed => {
                tracing::debug!(deployment = deployment_id, status = %deployment.status, "cancel of terminal deployment is a no-op");
            }
        }
        Ok(deployment)
    }

    /// Report that a running deployment finished before its timeout.
    ///
    /// Terminal deployments are returned unchanged; PENDING ones are refused.
    pub async fn complete_deployment(
        &self,
        deployment_id: DeploymentId,
    ) -> SchedulerResult<Deployment> {
        let cluster_id = self.get_deployment(deployment_id).await?.cluster_id;
        let domain = self.domain(cluster_id).await?;
        let _guard = domain.lock().await;

        let mut deployment = self.get_deployment(deployment_id).await?;
        match deployment.status {
            DeploymentStatus::Running => {
                self.conclude_locked(&mut deployment, Conclusion::Completed).await?;
                tracing::info!(deployment = deployment_id, cluster = cluster_id, "deployment completed");
                self.record(cluster_id, Some(&deployment), AuditAction::Complete, None);
                self.pass_logged(cluster_id).await;
                Ok(deployment)
            }
            DeploymentStatus::Pending => Err(SchedulerError::InvalidTransition {
                id: deployment_id,
                from: DeploymentStatus::Pending,
                to: DeploymentStatus::Completed,
            }),
            DeploymentStatus::Completed | DeploymentStatus::Failed => Ok(deployment),
        }
    }

    /// Admit queued deployments on a cluster until the queue is empty or its
    /// head does not fit. Returns the ids admitted, in admission order.
    ///
    /// Safe to call redundantly.
    pub async fn run_admission_pass(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<DeploymentId>> {
        let domain = self.domain(cluster_id).await?;
        let _guard = domain.lock().await;
        self.admission_pass_locked(cluster_id).await
    }

    /// Restore the PENDING/queue bijection for one cluster, then run a pass.
    ///
    /// Missing entries are re-queued in creation order, behind anything
    /// already queued at the same priority.
    pub async fn reconcile_cluster(&self, cluster_id: ClusterId) -> SchedulerResult<ReconcileReport> {
        let domain = self.domain(cluster_id).await?;
        let _guard = domain.lock().await;

        let mut pending: Vec<Deployment> = self
            .inner
            .store
            .list_deployments(cluster_id)
            .await?
            .into_iter()
            .filter(|d| d.status == DeploymentStatus::Pending)
            .collect();
        pending.sort_by_key(|d| (d.created_at_ms, d.id));
        let pending_ids: HashSet<DeploymentId> = pending.iter().map(|d| d.id).collect();

        let entries = self.inner.queue.entries(cluster_id).await?;
        let queued_ids: HashSet<DeploymentId> = entries.iter().map(|e| e.deployment_id).collect();

        let mut report = ReconcileReport {
            cluster_id,
            ..ReconcileReport::default()
        };
        for entry in &entries {
            if !pending_ids.contains(&entry.deployment_id) {
                self.inner.queue.remove(cluster_id, entry.deployment_id).await?;
                report.dropped.push(entry.deployment_id);
            }
        }
        for deployment in pending.iter().filter(|d| !queued_ids.contains(&d.id)) {
            self.inner
                .queue
                .enqueue(cluster_id, deployment.wait_entry(), deployment.priority)
                .await?;
            self.record(cluster_id, Some(deployment), AuditAction::Heal, Some("requeued".into()));
            report.enqueued.push(deployment.id);
        }
        if !report.enqueued.is_empty() || !report.dropped.is_empty() {
            tracing::warn!(
                cluster = cluster_id,
                enqueued = ?report.enqueued,
                dropped = ?report.dropped,
                "wait queue reconciled"
            );
        }

        report.admitted = self.admission_pass_locked(cluster_id).await?;
        Ok(report)
    }

    /// Restart hook: re-arm timeouts for RUNNING deployments with the time
    /// they have left, then reconcile every cluster.
    pub async fn recover(&self) -> SchedulerResult<Vec<ReconcileReport>> {
        let now = now_ms();
        let timeout = self.inner.options.deployment_timeout;
        let mut reports = Vec::new();
        for cluster in self.inner.store.list_clusters(None).await? {
            for deployment in self.inner.store.list_deployments(cluster.id).await? {
                if deployment.status != DeploymentStatus::Running {
                    continue;
                }
                let started = deployment.started_at_ms.unwrap_or(now);
                let delay = remaining(started, timeout, now);
                tracing::debug!(deployment = deployment.id, ?delay, "re-arming timeout");
                self.schedule_timeout(deployment.id, delay);
            }
            reports.push(self.reconcile_cluster(cluster.id).await?);
        }
        tracing::info!(clusters = reports.len(), "scheduler recovered");
        Ok(reports)
    }

    async fn pass_logged(&self, cluster_id: ClusterId) {
        if let Err(e) = self.admission_pass_locked(cluster_id).await {
            tracing::error!(cluster = cluster_id, error = %e, "admission pass aborted");
        }
    }

    async fn admission_pass_locked(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<DeploymentId>> {
        let mut admitted = Vec::new();
        loop {
            let Some(entry) = self.inner.queue.peek_highest(cluster_id).await? else {
                tracing::debug!(cluster = cluster_id, "queue empty");
                break;
            };

            let stored = self.inner.store.get_deployment(entry.deployment_id).await?;
            let mut deployment = match stored {
                Some(d) if d.status == DeploymentStatus::Pending && d.cluster_id == cluster_id => d,
                other => {
                    tracing::warn!(
                        cluster = cluster_id,
                        deployment = entry.deployment_id,
                        status = ?other.as_ref().map(|d| d.status),
                        "dropping stale queue entry"
                    );
                    self.inner.queue.remove(cluster_id, entry.deployment_id).await?;
                    self.record(cluster_id, other.as_ref(), AuditAction::Heal, Some("stale entry".into()));
                    continue;
                }
            };

            let mut cluster = self.get_cluster(cluster_id).await?;
            if !cluster.can_fit(&deployment.footprint) {
                tracing::debug!(
                    cluster = cluster_id,
                    deployment = deployment.id,
                    "head of queue does not fit; pass stops"
                );
                break;
            }
            if let Err(e) = cluster.allocate(&deployment.footprint) {
                tracing::error!(cluster = cluster_id, deployment = deployment.id, error = %e, "allocation refused after fit check");
                return Err(e);
            }
            deployment.start(now_ms())?;
            self.inner.store.commit(&cluster, &deployment).await?;
            self.schedule_timeout(deployment.id, self.inner.options.deployment_timeout);
            self.inner.queue.remove(cluster_id, deployment.id).await?;

            tracing::info!(
                cluster = cluster_id,
                deployment = deployment.id,
                priority = %deployment.priority,
                "deployment admitted"
            );
            self.record(cluster_id, Some(&deployment), AuditAction::Admit, None);
            admitted.push(deployment.id);
        }
        Ok(admitted)
    }

    /// Release a running deployment's footprint and move it to a terminal
    /// state, persisting both together. Caller holds the cluster domain.
    async fn conclude_locked(
        &self,
        deployment: &mut Deployment,
        conclusion: Conclusion,
    ) -> SchedulerResult<()> {
        let mut cluster = self.get_cluster(deployment.cluster_id).await?;
        if let Err(e) = cluster.release(&deployment.footprint) {
            tracing::error!(cluster = cluster.id, deployment = deployment.id, error = %e, "release refused");
            return Err(e);
        }
        let mut next = deployment.clone();
        match conclusion {
            Conclusion::Completed => next.complete(now_ms())?,
            Conclusion::Failed => next.fail(now_ms())?,
        }
        self.inner.store.commit(&cluster, &next).await?;
        *deployment = next;
        Ok(())
    }

    fn schedule_timeout(&self, deployment_id: DeploymentId, delay: Duration) {
        self.inner
            .spawner
            .spawn_after(delay, self.clone().fire_timeout(deployment_id));
    }

    fn fire_timeout(self, deployment_id: DeploymentId) -> ReaperFuture {
        Box::pin(async move {
            if let Err(e) = self.handle_timeout(deployment_id).await {
                tracing::error!(deployment = deployment_id, error = %e, "timeout handling failed");
            }
        })
    }

    async fn handle_timeout(&self, deployment_id: DeploymentId) -> SchedulerResult<()> {
        let Some(snapshot) = self.inner.store.get_deployment(deployment_id).await? else {
            return Ok(());
        };
        let cluster_id = snapshot.cluster_id;
        let domain = self.domain(cluster_id).await?;
        let _guard = domain.lock().await;

        let mut deployment = self.get_deployment(deployment_id).await?;
        if deployment.status != DeploymentStatus::Running {
            tracing::debug!(deployment = deployment_id, status = %deployment.status, "timeout fired after conclusion; ignoring");
            return Ok(());
        }
        self.conclude_locked(&mut deployment, Conclusion::Completed).await?;
        tracing::info!(deployment = deployment_id, cluster = cluster_id, "deployment completed by timeout");
        self.record(cluster_id, Some(&deployment), AuditAction::Timeout, None);
        self.pass_logged(cluster_id).await;
        Ok(())
    }
}
