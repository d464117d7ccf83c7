use std::time::Duration;

use common::config::{QueueSettings, StoreSettings};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Worker pool tunables.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerSettings {
    /// Worker ids are `"{id_prefix}-{n}"`. Default: "worker".
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// Number of concurrent worker loops. Default: 2.
    #[serde(default = "default_count")]
    pub count: usize,
    /// How long each pop blocks waiting for a ready job. Default: 5.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound on the random pause after a store error. Default: 100.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    /// Exit once the queue has nothing ready instead of waiting for more.
    /// Used for batch runs. Default: false.
    #[serde(default)]
    pub drain_when_idle: bool,
}

fn default_id_prefix() -> String {
    "worker".into()
}
fn default_count() -> usize {
    2
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_jitter_ms() -> u64 {
    100
}

impl WorkerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            count: default_count(),
            poll_interval_secs: default_poll_interval_secs(),
            jitter_ms: default_jitter_ms(),
            drain_when_idle: false,
        }
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub queue: QueueSettings,
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CALLQ_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("worker.id_prefix", "worker")?
            .set_default("worker.count", 2_i64)?
            .set_default("worker.poll_interval_secs", 5_i64)?
            .set_default("worker.jitter_ms", 100_i64)?
            .set_default("store.url", "redis://localhost:6379")?
            .set_default("store.namespace", "callq")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("CALLQ").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
