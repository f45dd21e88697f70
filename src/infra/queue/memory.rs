//! In-memory wait queue: one priority index per cluster.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{SchedulerError, SchedulerResult, WaitEntry, WaitQueue};
use crate::util::serde::{ClusterId, DeploymentId, Priority};

/// Ordering key: highest score first, then enqueue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    score: Reverse<u8>,
    seq: u64,
}

/// Sorted set of one cluster's waiting entries.
#[derive(Debug, Default)]
pub(crate) struct ClusterQueue {
    order: BTreeMap<QueueKey, WaitEntry>,
    index: HashMap<DeploymentId, QueueKey>,
}

impl ClusterQueue {
    fn insert(&mut self, entry: WaitEntry, priority: Priority, seq: u64) -> SchedulerResult<()> {
        if self.index.contains_key(&entry.deployment_id) {
            return Err(SchedulerError::DuplicateEntry(entry.deployment_id));
        }
        let key = QueueKey {
            score: Reverse(priority.score()),
            seq,
        };
        self.index.insert(entry.deployment_id, key);
        self.order.insert(key, entry);
        Ok(())
    }

    fn peek(&self) -> Option<WaitEntry> {
        self.order.values().next().copied()
    }

    fn remove(&mut self, deployment_id: DeploymentId) -> bool {
        match self.index.remove(&deployment_id) {
            Some(key) => self.order.remove(&key).is_some(),
            None => false,
        }
    }

    fn entries(&self) -> Vec<WaitEntry> {
        self.order.values().copied().collect()
    }

    fn records(&self) -> impl Iterator<Item = (Priority, u64, WaitEntry)> + '_ {
        self.order.iter().filter_map(|(key, entry)| {
            Priority::try_from(key.score.0)
                .ok()
                .map(|priority| (priority, key.seq, *entry))
        })
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// State shared by the in-memory and file-backed queues.
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    clusters: HashMap<ClusterId, ClusterQueue>,
    next_seq: u64,
}

impl QueueState {
    /// Insert with a fresh sequence number, returning it.
    pub(crate) fn insert(
        &mut self,
        cluster_id: ClusterId,
        entry: WaitEntry,
        priority: Priority,
    ) -> SchedulerResult<u64> {
        let seq = self.next_seq;
        self.insert_with_seq(cluster_id, entry, priority, seq)?;
        Ok(seq)
    }

    /// Insert with a known sequence number (used when replaying from disk).
    pub(crate) fn insert_with_seq(
        &mut self,
        cluster_id: ClusterId,
        entry: WaitEntry,
        priority: Priority,
        seq: u64,
    ) -> SchedulerResult<()> {
        self.clusters
            .entry(cluster_id)
            .or_default()
            .insert(entry, priority, seq)?;
        self.next_seq = self.next_seq.max(seq + 1);
        Ok(())
    }

    pub(crate) fn peek(&self, cluster_id: ClusterId) -> Option<WaitEntry> {
        self.clusters.get(&cluster_id).and_then(ClusterQueue::peek)
    }

    pub(crate) fn remove(&mut self, cluster_id: ClusterId, deployment_id: DeploymentId) -> bool {
        let Some(queue) = self.clusters.get_mut(&cluster_id) else {
            return false;
        };
        let removed = queue.remove(deployment_id);
        if queue.order.is_empty() {
            self.clusters.remove(&cluster_id);
        }
        removed
    }

    pub(crate) fn entries(&self, cluster_id: ClusterId) -> Vec<WaitEntry> {
        self.clusters
            .get(&cluster_id)
            .map(ClusterQueue::entries)
            .unwrap_or_default()
    }

    /// Every entry across all clusters with its ordering data.
    pub(crate) fn records(
        &self,
    ) -> impl Iterator<Item = (ClusterId, Priority, u64, WaitEntry)> + '_ {
        self.clusters.iter().flat_map(|(&cluster_id, queue)| {
            queue
                .records()
                .map(move |(priority, seq, entry)| (cluster_id, priority, seq, entry))
        })
    }

    pub(crate) fn len(&self, cluster_id: ClusterId) -> usize {
        self.clusters.get(&cluster_id).map_or(0, ClusterQueue::len)
    }
}

/// In-memory wait queue for development, tests and single-process setups.
#[derive(Debug, Default)]
pub struct InMemoryWaitQueue {
    state: Mutex<QueueState>,
}

impl InMemoryWaitQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries waiting on a cluster.
    pub fn len(&self, cluster_id: ClusterId) -> usize {
        self.state.lock().len(cluster_id)
    }

    /// Whether a cluster has nothing waiting.
    pub fn is_empty(&self, cluster_id: ClusterId) -> bool {
        self.len(cluster_id) == 0
    }
}

#[async_trait]
impl WaitQueue for InMemoryWaitQueue {
    async fn enqueue(
        &self,
        cluster_id: ClusterId,
        entry: WaitEntry,
        priority: Priority,
    ) -> SchedulerResult<()> {
        self.state.lock().insert(cluster_id, entry, priority)?;
        Ok(())
    }

    async fn peek_highest(&self, cluster_id: ClusterId) -> SchedulerResult<Option<WaitEntry>> {
        Ok(self.state.lock().peek(cluster_id))
    }

    async fn remove(
        &self,
        cluster_id: ClusterId,
        deployment_id: DeploymentId,
    ) -> SchedulerResult<bool> {
        Ok(self.state.lock().remove(cluster_id, deployment_id))
    }

    async fn entries(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<WaitEntry>> {
        Ok(self.state.lock().entries(cluster_id))
    }
}
