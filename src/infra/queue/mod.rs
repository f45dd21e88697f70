//! Wait-queue backends.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::core::{SchedulerResult, WaitEntry, WaitQueue};
use crate::util::serde::{ClusterId, DeploymentId, Priority};

pub use file::FileWaitQueue;
pub use memory::InMemoryWaitQueue;

/// Wait queue selected at runtime from configuration.
#[derive(Debug)]
pub enum QueueBackend {
    /// Volatile queue.
    InMemory(InMemoryWaitQueue),
    /// JSON-lines file queue.
    File(FileWaitQueue),
}

#[async_trait]
impl WaitQueue for QueueBackend {
    async fn enqueue(
        &self,
        cluster_id: ClusterId,
        entry: WaitEntry,
        priority: Priority,
    ) -> SchedulerResult<()> {
        match self {
            Self::InMemory(q) => q.enqueue(cluster_id, entry, priority).await,
            Self::File(q) => q.enqueue(cluster_id, entry, priority).await,
        }
    }

    async fn peek_highest(&self, cluster_id: ClusterId) -> SchedulerResult<Option<WaitEntry>> {
        match self {
            Self::InMemory(q) => q.peek_highest(cluster_id).await,
            Self::File(q) => q.peek_highest(cluster_id).await,
        }
    }

    async fn remove(
        &self,
        cluster_id: ClusterId,
        deployment_id: DeploymentId,
    ) -> SchedulerResult<bool> {
        match self {
            Self::InMemory(q) => q.remove(cluster_id, deployment_id).await,
            Self::File(q) => q.remove(cluster_id, deployment_id).await,
        }
    }

    async fn entries(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<WaitEntry>> {
        match self {
            Self::InMemory(q) => q.entries(cluster_id).await,
            Self::File(q) => q.entries(cluster_id).await,
        }
    }
}
