//! Scheduler configuration structures.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::SchedulerOptions;

/// Environment variable holding the deployment timeout in seconds.
pub const ENV_DEPLOYMENT_TIMEOUT: &str = "DEPLOYMENT_TIMEOUT";
/// Environment variable selecting the queue backend (`in_memory` or `file`).
pub const ENV_QUEUE_BACKEND: &str = "SCHEDULER_QUEUE_BACKEND";
/// Environment variable holding the file queue directory.
pub const ENV_QUEUE_PATH: &str = "SCHEDULER_QUEUE_PATH";

/// Queue backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackendConfig {
    /// In-memory queue for development/testing.
    #[default]
    InMemory,
    /// JSON-lines file queue that survives restarts.
    File,
}

impl std::str::FromStr for QueueBackendConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(Self::InMemory),
            "file" => Ok(Self::File),
            other => Err(format!("unknown queue backend `{other}`")),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    300
}

fn default_stream() -> String {
    "pending_deployments".into()
}

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds a deployment may stay RUNNING before the reaper completes it.
    #[serde(default = "default_timeout_secs")]
    pub deployment_timeout_secs: u64,
    /// Queue backend selection.
    #[serde(default)]
    pub queue: QueueBackendConfig,
    /// Directory for the file queue.
    #[serde(default)]
    pub queue_path: Option<PathBuf>,
    /// File name stem for the file queue.
    #[serde(default = "default_stream")]
    pub queue_stream: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            deployment_timeout_secs: default_timeout_secs(),
            queue: QueueBackendConfig::InMemory,
            queue_path: None,
            queue_stream: default_stream(),
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.deployment_timeout_secs == 0 {
            return Err("deployment_timeout_secs must be greater than 0".into());
        }
        if self.queue == QueueBackendConfig::File && self.queue_path.is_none() {
            return Err("queue_path is required for the file queue backend".into());
        }
        if self.queue_stream.trim().is_empty() {
            return Err("queue_stream must not be empty".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading `.env` first
    /// if present. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup and validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_DEPLOYMENT_TIMEOUT) {
            cfg.deployment_timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_DEPLOYMENT_TIMEOUT}: {e}"))?;
        }
        if let Some(raw) = lookup(ENV_QUEUE_BACKEND) {
            cfg.queue = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_QUEUE_PATH) {
            cfg.queue_path = Some(PathBuf::from(raw));
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deployment timeout as a duration.
    pub const fn deployment_timeout(&self) -> Duration {
        Duration::from_secs(self.deployment_timeout_secs)
    }

    /// Scheduler tunables derived from this configuration.
    pub const fn options(&self) -> SchedulerOptions {
        SchedulerOptions {
            deployment_timeout: self.deployment_timeout(),
        }
    }
}
