//! Audit trail of deployment lifecycle actions.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::DeploymentStatus;
use crate::util::clock::now_ms;
use crate::util::serde::{ClusterId, DeploymentId};

/// Lifecycle action recorded by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Deployment created and queued.
    Enqueue,
    /// Deployment admitted and capacity allocated.
    Admit,
    /// Deployment cancelled by a caller.
    Cancel,
    /// Deployment reported finished by a caller.
    Complete,
    /// Deployment completed by the timeout reaper.
    Timeout,
    /// Queue entry dropped or restored to match deployment state.
    Heal,
    /// Request refused at creation.
    Reject,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Enqueue => "enqueue",
            Self::Admit => "admit",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
            Self::Timeout => "timeout",
            Self::Heal => "heal",
            Self::Reject => "reject",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Cluster the action applied to.
    pub cluster_id: ClusterId,
    /// Deployment involved; absent for rejected requests.
    pub deployment_id: Option<DeploymentId>,
    /// Action taken.
    pub action: AuditAction,
    /// Deployment status after the action, when known.
    pub status: Option<DeploymentStatus>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory audit sink. Clones share one buffer, so a test can keep a
/// handle while the scheduler owns another.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Actions recorded for one deployment, oldest first.
    pub fn actions_for(&self, deployment_id: DeploymentId) -> Vec<AuditAction> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.deployment_id == Some(deployment_id))
            .map(|e| e.action)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Sink that emits each event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        tracing::info!(
            target: "cluster_parking_lot::audit",
            event_id = %event.event_id,
            cluster = event.cluster_id,
            deployment = ?event.deployment_id,
            action = %event.action,
            status = ?event.status,
            payload = ?event.payload,
            "audit"
        );
    }
}

/// Helper to build an audit event stamped with a fresh id and the current time.
pub fn build_audit_event(
    cluster_id: ClusterId,
    deployment_id: Option<DeploymentId>,
    action: AuditAction,
    status: Option<DeploymentStatus>,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        cluster_id,
        deployment_id,
        action,
        status,
        created_at_ms: now_ms(),
        payload,
    }
}
