//! Tests for configuration validation

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use cluster_parking_lot::config::{QueueBackendConfig, SchedulerConfig};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.deployment_timeout(), Duration::from_secs(300));
    assert_eq!(cfg.queue, QueueBackendConfig::InMemory);
    assert_eq!(cfg.options().deployment_timeout, Duration::from_secs(300));
}

#[test]
fn test_zero_timeout_is_invalid() {
    let cfg = SchedulerConfig {
        deployment_timeout_secs: 0,
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_file_backend_requires_path() {
    let cfg = SchedulerConfig {
        queue: QueueBackendConfig::File,
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = SchedulerConfig {
        queue: QueueBackendConfig::File,
        queue_path: Some(PathBuf::from("/tmp/q")),
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_empty_stream_is_invalid() {
    let cfg = SchedulerConfig {
        queue_stream: "  ".into(),
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_applies_defaults() {
    let cfg = SchedulerConfig::from_json_str(r#"{"deployment_timeout_secs": 60}"#).unwrap();
    assert_eq!(cfg.deployment_timeout_secs, 60);
    assert_eq!(cfg.queue, QueueBackendConfig::InMemory);
    assert_eq!(cfg.queue_stream, "pending_deployments");

    let cfg = SchedulerConfig::from_json_str(
        r#"{"queue": "file", "queue_path": "/var/lib/sched", "queue_stream": "q"}"#,
    )
    .unwrap();
    assert_eq!(cfg.queue, QueueBackendConfig::File);
    assert_eq!(cfg.queue_path, Some(PathBuf::from("/var/lib/sched")));
}

#[test]
fn test_from_json_rejects_bad_input() {
    assert!(SchedulerConfig::from_json_str("not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{"deployment_timeout_secs": 0}"#).is_err());
}

#[test]
fn test_from_lookup_reads_variables() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        ("DEPLOYMENT_TIMEOUT", " 45 "),
        ("SCHEDULER_QUEUE_BACKEND", "FILE"),
        ("SCHEDULER_QUEUE_PATH", "/data/queue"),
    ]))
    .unwrap();
    assert_eq!(cfg.deployment_timeout(), Duration::from_secs(45));
    assert_eq!(cfg.queue, QueueBackendConfig::File);
    assert_eq!(cfg.queue_path, Some(PathBuf::from("/data/queue")));
}

#[test]
fn test_from_lookup_defaults_when_unset() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, SchedulerConfig::default());
}

#[test]
fn test_from_lookup_rejects_bad_values() {
    assert!(SchedulerConfig::from_lookup(lookup(&[("DEPLOYMENT_TIMEOUT", "soon")])).is_err());
    assert!(SchedulerConfig::from_lookup(lookup(&[("SCHEDULER_QUEUE_BACKEND", "redis")])).is_err());
    // File backend without a path fails validation.
    assert!(SchedulerConfig::from_lookup(lookup(&[("SCHEDULER_QUEUE_BACKEND", "file")])).is_err());
}

#[test]
fn test_backend_parse() {
    assert_eq!("memory".parse::<QueueBackendConfig>().unwrap(), QueueBackendConfig::InMemory);
    assert_eq!("in_memory".parse::<QueueBackendConfig>().unwrap(), QueueBackendConfig::InMemory);
    assert!("postgres".parse::<QueueBackendConfig>().is_err());
}
