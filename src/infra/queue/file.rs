//! File-backed wait queue.
//!
//! Entries are kept in memory and mirrored to a JSON-lines file so queued
//! deployments survive a restart. Enqueue appends one line; removal writes a
//! temp file and renames it over the old one. A torn final line left by an
//! interrupted append is dropped on load. The enqueue sequence number is
//! persisted with each line, so equal-priority ordering is the same after a
//! reload.

use std::fs::{self, create_dir_all, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{SchedulerError, SchedulerResult, WaitEntry, WaitQueue};
use crate::infra::queue::memory::QueueState;
use crate::util::serde::{ClusterId, DeploymentId, Priority};

/// One persisted queue line.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueueRecord {
    cluster_id: ClusterId,
    priority: Priority,
    seq: u64,
    entry: WaitEntry,
}

fn backend<E: std::fmt::Display>(e: E) -> SchedulerError {
    SchedulerError::Backend(e.to_string())
}

/// File-backed wait queue using JSON lines for durability.
#[derive(Debug)]
pub struct FileWaitQueue {
    path: PathBuf,
    stream: String,
    state: Mutex<QueueState>,
}

impl FileWaitQueue {
    /// Open (or create) the queue stored as `<path>/<stream>.jsonl`.
    pub fn new(path: impl AsRef<Path>, stream: impl Into<String>) -> SchedulerResult<Self> {
        let path = path.as_ref().to_path_buf();
        create_dir_all(&path).map_err(backend)?;
        let queue = Self {
            path,
            stream: stream.into(),
            state: Mutex::new(QueueState::default()),
        };
        queue.load_from_disk()?;
        Ok(queue)
    }

    /// Location of the backing file.
    pub fn file_path(&self) -> PathBuf {
        self.path.join(format!("{}.jsonl", self.stream))
    }

    fn load_from_disk(&self) -> SchedulerResult<()> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(());
        }
        let contents = fs::read_to_string(&file_path).map_err(backend)?;
        let mut state = self.state.lock();
        let mut loaded = 0usize;
        let mut torn_tail = false;
        for line in contents.split_inclusive('\n') {
            if line.trim().is_empty() {
                continue;
            }
            let record: QueueRecord = match serde_json::from_str(line.trim_end()) {
                Ok(record) => record,
                // An unterminated last line is an append cut short by a crash.
                Err(e) if !line.ends_with('\n') => {
                    tracing::warn!(path = %file_path.display(), error = %e, "dropping torn final queue line");
                    torn_tail = true;
                    continue;
                }
                Err(e) => return Err(backend(e)),
            };
            state.insert_with_seq(record.cluster_id, record.entry, record.priority, record.seq)?;
            loaded += 1;
        }
        if torn_tail {
            self.rewrite_disk(&state)?;
        }
        tracing::info!(path = %file_path.display(), entries = loaded, "wait queue loaded");
        Ok(())
    }

    fn append_to_disk(&self, record: &QueueRecord) -> SchedulerResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path())
            .map_err(backend)?;
        let line = serde_json::to_string(record).map_err(backend)?;
        writeln!(file, "{line}").map_err(backend)
    }

    /// Replace the file with the current state. The new contents go to a
    /// sibling temp file first, so a crash leaves either the old or the new
    /// file in place.
    fn rewrite_disk(&self, state: &QueueState) -> SchedulerResult<()> {
        let file_path = self.file_path();
        let tmp_path = file_path.with_extension("jsonl.tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(backend)?;
        let mut writer = BufWriter::new(file);
        for (cluster_id, priority, seq, entry) in state.records() {
            let record = QueueRecord {
                cluster_id,
                priority,
                seq,
                entry,
            };
            let line = serde_json::to_string(&record).map_err(backend)?;
            writeln!(writer, "{line}").map_err(backend)?;
        }
        let file = writer.into_inner().map_err(backend)?;
        file.sync_all().map_err(backend)?;
        fs::rename(&tmp_path, &file_path).map_err(backend)
    }
}

#[async_trait]
impl WaitQueue for FileWaitQueue {
    async fn enqueue(
        &self,
        cluster_id: ClusterId,
        entry: WaitEntry,
        priority: Priority,
    ) -> SchedulerResult<()> {
        let mut state = self.state.lock();
        let seq = state.insert(cluster_id, entry, priority)?;
        let record = QueueRecord {
            cluster_id,
            priority,
            seq,
            entry,
        };
        if let Err(e) = self.append_to_disk(&record) {
            state.remove(cluster_id, entry.deployment_id);
            return Err(e);
        }
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
        let mut state = self.state.lock();
        if !state.remove(cluster_id, deployment_id) {
            return Ok(false);
        }
        self.rewrite_disk(&state)?;
        Ok(true)
    }

    async fn entries(&self, cluster_id: ClusterId) -> SchedulerResult<Vec<WaitEntry>> {
        Ok(self.state.lock().entries(cluster_id))
    }
}
