//! Tests for builder modules

use std::time::Duration;

use cluster_parking_lot::builders::{build_queue, build_scheduler, build_scheduler_from_env};
use cluster_parking_lot::config::{QueueBackendConfig, SchedulerConfig};
use cluster_parking_lot::core::{DeploymentMetadata, DeploymentStatus, Resources, SchedulerError};
use cluster_parking_lot::infra::{InMemoryStore, QueueBackend};
use cluster_parking_lot::runtime::TokioSpawner;
use cluster_parking_lot::util::Priority;

fn temp_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("cpl-builder-{}", uuid::Uuid::new_v4()))
}

#[test]
fn test_build_in_memory_queue() {
    let queue = build_queue(&SchedulerConfig::default()).unwrap();
    assert!(matches!(queue, QueueBackend::InMemory(_)));
}

#[test]
fn test_build_file_queue() {
    let dir = temp_dir();
    let cfg = SchedulerConfig {
        queue: QueueBackendConfig::File,
        queue_path: Some(dir.clone()),
        queue_stream: "builder".into(),
        ..SchedulerConfig::default()
    };
    match build_queue(&cfg).unwrap() {
        QueueBackend::File(q) => assert_eq!(q.file_path(), dir.join("builder.jsonl")),
        QueueBackend::InMemory(_) => panic!("expected file queue"),
    }
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_build_rejects_invalid_config() {
    let cfg = SchedulerConfig {
        queue: QueueBackendConfig::File,
        ..SchedulerConfig::default()
    };
    assert!(matches!(build_queue(&cfg), Err(SchedulerError::Config(_))));
}

#[tokio::test]
async fn test_build_scheduler_applies_timeout() {
    let cfg = SchedulerConfig {
        deployment_timeout_secs: 42,
        ..SchedulerConfig::default()
    };
    let scheduler = build_scheduler(&cfg, InMemoryStore::new(), TokioSpawner::current()).unwrap();
    assert_eq!(scheduler.options().deployment_timeout, Duration::from_secs(42));

    let cluster = scheduler
        .register_cluster(1, "built", Resources::new(2, 2, 0))
        .await
        .unwrap();
    let d = scheduler
        .create_deployment(
            cluster.id,
            Resources::new(1, 1, 0),
            Priority::Normal,
            DeploymentMetadata::new("svc", "img"),
        )
        .await
        .unwrap();
    assert_eq!(d.status, DeploymentStatus::Running);
}

#[tokio::test]
async fn test_build_scheduler_from_env_defaults() {
    // Assumes the test environment does not set the scheduler variables.
    let scheduler = build_scheduler_from_env(InMemoryStore::new(), TokioSpawner::current()).unwrap();
    assert!(matches!(scheduler.queue(), QueueBackend::InMemory(_)));
}
