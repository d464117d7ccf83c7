use serde::Deserialize;

/// Connection settings for the shared job/event store.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    /// Redis connection URL. Default: "redis://localhost:6379".
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Key prefix separating this deployment's keys. Default: "callq".
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_store_url() -> String {
    "redis://localhost:6379".into()
}
fn default_namespace() -> String {
    "callq".into()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            namespace: default_namespace(),
        }
    }
}

/// Tunables for the job queue manager.
#[derive(Debug, Deserialize, Clone)]
pub struct QueueSettings {
    /// Per-job handler deadline when the enqueue call does not override it.
    /// Default: 300.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    /// Retry budget when the enqueue call does not override it. Default: 3.
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
    /// How long finished job records stay queryable. Default: 86400 (24h).
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// Escalating retry delays in seconds, indexed by retry count and
    /// clamped to the last entry. Default: [60, 300, 900].
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,
}

fn default_timeout_secs() -> u64 {
    300
}
fn default_max_retries() -> u32 {
    3
}
fn default_retention_secs() -> u64 {
    86_400
}
fn default_backoff_secs() -> Vec<u64> {
    vec![60, 300, 900]
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            default_max_retries: default_max_retries(),
            retention_secs: default_retention_secs(),
            backoff_secs: default_backoff_secs(),
        }
    }
}
