use crate::job::JobPriority;

/// Store key layout, prefixed with a namespace so deployments can share a
/// backend without colliding.
#[derive(Debug, Clone)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Ready list for one priority tier.
    pub fn ready(&self, priority: JobPriority) -> String {
        format!("{}:queue:{}", self.namespace, priority)
    }

    /// All ready lists in pop order, most urgent first.
    pub fn ready_keys(&self) -> Vec<String> {
        JobPriority::ALL.iter().map(|p| self.ready(*p)).collect()
    }

    /// Sorted set of delayed and retrying job ids, scored by due time.
    pub fn delayed(&self) -> String {
        format!("{}:delayed", self.namespace)
    }

    /// JSON record for one job.
    pub fn record(&self, job_id: &str) -> String {
        format!("{}:job:{}", self.namespace, job_id)
    }

    /// Sorted set of every tracked job id, scored by enqueue time. Used to
    /// walk records for stats and pruned as records expire.
    pub fn index(&self) -> String {
        format!("{}:jobs", self.namespace)
    }
}
