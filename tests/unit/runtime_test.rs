//! Tests for tokio spawner and API adapters

use std::time::Duration;

use cluster_parking_lot::core::{DeploymentStatus, Resources, Spawn};
use cluster_parking_lot::runtime::api::{health, list_clusters};
use cluster_parking_lot::runtime::{
    deployment_stats, submit_deployment, CreateDeploymentRequest, TokioSpawner,
};
use cluster_parking_lot::util::Priority;

use crate::common::tokio_scheduler;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_zero_delay_runs() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn_after(Duration::ZERO, async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_spawner_spawn_after_waits() {
    let spawner = TokioSpawner::current();
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    spawner.spawn_after(Duration::from_secs(10), async move {
        tx.send(()).unwrap();
    });

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert!(rx.try_recv().is_err());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn test_api_adapters() {
    let s = tokio_scheduler(Duration::from_secs(300));
    let cluster = s.register_cluster(7, "api", Resources::new(4, 8, 0)).await.unwrap();
    s.register_cluster(8, "other-org", Resources::new(1, 1, 0)).await.unwrap();

    let req = CreateDeploymentRequest {
        cluster_id: cluster.id,
        name: "web".into(),
        image: "registry.local/web:2".into(),
        cpu_required: 2,
        ram_required: 4,
        gpu_required: 0,
        priority: Priority::High,
    };
    let d = submit_deployment(&s, req.clone()).await.unwrap();
    assert_eq!(d.status, DeploymentStatus::Running);
    assert_eq!(d.metadata.name, "web");
    let queued = submit_deployment(&s, CreateDeploymentRequest { cpu_required: 3, ..req })
        .await
        .unwrap();
    assert_eq!(queued.status, DeploymentStatus::Pending);

    let snapshots = list_clusters(&s, 7).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].available, Resources::new(2, 4, 0));
    assert_eq!(snapshots[0].utilisation["cpu"], 0.5);

    let stats = deployment_stats(&s, 7).await.unwrap();
    assert_eq!(stats.total_deployments, 2);
    assert_eq!(stats.active_deployments, 1);
    assert_eq!(stats.pending_deployments, 1);
    assert_eq!(stats.priority_distribution[&3], 2);

    assert!(health().ok);
}
