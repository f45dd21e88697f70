//! Build a [`DeploymentScheduler`] from [`SchedulerConfig`].

use anyhow::Context;

use crate::config::{QueueBackendConfig, SchedulerConfig};
use crate::core::{
    AppResult, DeploymentScheduler, SchedulerError, SchedulerResult, SchedulerStore, Spawn,
};
use crate::infra::queue::{FileWaitQueue, InMemoryWaitQueue, QueueBackend};

/// Open the wait queue the configuration selects.
pub fn build_queue(cfg: &SchedulerConfig) -> SchedulerResult<QueueBackend> {
    cfg.validate().map_err(SchedulerError::Config)?;
    match cfg.queue {
        QueueBackendConfig::InMemory => Ok(QueueBackend::InMemory(InMemoryWaitQueue::new())),
        QueueBackendConfig::File => {
            let path = cfg
                .queue_path
                .as_ref()
                .ok_or_else(|| SchedulerError::Config("queue_path missing".into()))?;
            let queue = FileWaitQueue::new(path, cfg.queue_stream.clone())?;
            Ok(QueueBackend::File(queue))
        }
    }
}

/// Validate configuration and assemble a scheduler over `store` and `spawner`.
///
/// Does not call [`DeploymentScheduler::recover`]; do that once the runtime
/// is up if the queue or store outlive the process.
pub fn build_scheduler<S, D>(
    cfg: &SchedulerConfig,
    store: S,
    spawner: D,
) -> SchedulerResult<DeploymentScheduler<S, QueueBackend, D>>
where
    S: SchedulerStore,
    D: Spawn + Send + Sync + 'static,
{
    let queue = build_queue(cfg)?;
    tracing::info!(
        timeout_secs = cfg.deployment_timeout_secs,
        queue = ?cfg.queue,
        "building deployment scheduler"
    );
    Ok(DeploymentScheduler::new(store, queue, spawner, cfg.options()))
}

/// Load configuration from the environment (and `.env`) and build a scheduler.
pub fn build_scheduler_from_env<S, D>(
    store: S,
    spawner: D,
) -> AppResult<DeploymentScheduler<S, QueueBackend, D>>
where
    S: SchedulerStore,
    D: Spawn + Send + Sync + 'static,
{
    let cfg = SchedulerConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading scheduler configuration")?;
    build_scheduler(&cfg, store, spawner).context("building scheduler")
}
