//! Core scheduling abstractions and capacity accounting.

pub mod audit;
pub mod deployment;
pub mod error;
pub mod ledger;
pub mod scheduler;
pub mod store;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use deployment::{
    Deployment, DeploymentMetadata, DeploymentStatus, NewDeployment, WaitEntry,
};
pub use error::{AppResult, SchedulerError, SchedulerResult};
pub use ledger::{Cluster, Resources};
pub use scheduler::{
    DeploymentScheduler, ReconcileReport, SchedulerOptions, DEFAULT_DEPLOYMENT_TIMEOUT,
};
pub use store::{SchedulerStore, Spawn, WaitQueue};
