//! Runtime adapters and API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{
    deployment_stats, submit_deployment, ClusterSnapshot, CreateDeploymentRequest,
    DeploymentStats,
};
pub use tokio_spawner::TokioSpawner;
