//! Tests for error types

use cluster_parking_lot::core::{DeploymentStatus, SchedulerError};
use cluster_parking_lot::util::ResourceKind;

#[test]
fn test_not_found_errors() {
    assert_eq!(SchedulerError::ClusterNotFound(3).to_string(), "cluster not found: 3");
    assert_eq!(SchedulerError::DeploymentNotFound(9).to_string(), "deployment not found: 9");
}

#[test]
fn test_unsatisfiable_request_error() {
    let err = SchedulerError::UnsatisfiableRequest {
        kind: ResourceKind::Gpu,
        required: 2,
        limit: 1,
    };
    assert_eq!(
        err.to_string(),
        "unsatisfiable request: gpu requires 2, cluster limit is 1"
    );
    assert!(!err.is_internal());
}

#[test]
fn test_invalid_transition_error() {
    let err = SchedulerError::InvalidTransition {
        id: 5,
        from: DeploymentStatus::Pending,
        to: DeploymentStatus::Completed,
    };
    assert_eq!(err.to_string(), "deployment 5 cannot move from pending to completed");
}

#[test]
fn test_ledger_corruption_is_internal() {
    let err = SchedulerError::LedgerCorruption {
        cluster: 1,
        kind: ResourceKind::Cpu,
        released: 4,
        would_be: 12,
        limit: 8,
    };
    assert!(err.is_internal());
    assert!(err.to_string().contains("would reach 12, limit 8"));
}

#[test]
fn test_backend_error() {
    let err = SchedulerError::Backend("disk full".to_string());
    assert_eq!(format!("{}", err), "backend error: disk full");
    assert!(err.is_internal());
}

#[test]
fn test_invalid_priority_error() {
    assert_eq!(
        SchedulerError::InvalidPriority(7).to_string(),
        "invalid priority 7: expected 1..=3"
    );
}
