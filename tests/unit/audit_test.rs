//! Tests for audit sink

use cluster_parking_lot::core::{
    build_audit_event, AuditAction, AuditSink, DeploymentStatus, InMemoryAuditSink,
    TracingAuditSink,
};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        1,
        Some(7),
        AuditAction::Admit,
        Some(DeploymentStatus::Running),
        Some("payload".to_string()),
    );

    sink.record(event.clone());
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].deployment_id, Some(7));
    assert_eq!(events[0].action, AuditAction::Admit);
    assert_eq!(events[0].status, Some(DeploymentStatus::Running));
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, Some(1), AuditAction::Enqueue, None, None));
    sink.record(build_audit_event(1, Some(2), AuditAction::Enqueue, None, None));
    sink.record(build_audit_event(1, Some(3), AuditAction::Enqueue, None, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].deployment_id, Some(2)); // First one popped
    assert_eq!(events[1].deployment_id, Some(3));
}

#[test]
fn test_clones_share_buffer() {
    let reader = InMemoryAuditSink::new(8);
    let mut writer = reader.clone();

    writer.record(build_audit_event(1, Some(4), AuditAction::Enqueue, None, None));
    writer.record(build_audit_event(1, None, AuditAction::Reject, None, None));
    writer.record(build_audit_event(1, Some(4), AuditAction::Cancel, None, None));

    assert_eq!(reader.events().len(), 3);
    assert_eq!(
        reader.actions_for(4),
        vec![AuditAction::Enqueue, AuditAction::Cancel]
    );
}

#[test]
fn test_event_ids_are_unique() {
    let a = build_audit_event(1, None, AuditAction::Heal, None, None);
    let b = build_audit_event(1, None, AuditAction::Heal, None, None);
    assert_ne!(a.event_id, b.event_id);
}

#[test]
fn test_action_serializes_snake_case() {
    let json = serde_json::to_string(&AuditAction::Timeout).unwrap();
    assert_eq!(json, "\"timeout\"");
    assert_eq!(AuditAction::Reject.to_string(), "reject");
}

#[test]
fn test_tracing_sink_accepts_events() {
    let mut sink = TracingAuditSink;
    sink.record(build_audit_event(1, Some(1), AuditAction::Complete, None, None));
}
