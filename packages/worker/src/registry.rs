use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::jobs::JobKind;
use jobq::Job;

/// One unit of background work, keyed by [`JobKind`].
///
/// The returned JSON value is persisted on the job record as its result.
/// Errors are recorded verbatim and sent through the queue's retry
/// schedule, so handlers should put everything a retry needs into the job
/// payload rather than into internal state.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> anyhow::Result<serde_json::Value>;
}

/// Dispatch table from job kind to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<JobKind, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous registration.
    pub fn register(&mut self, kind: JobKind, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(kind, handler);
    }

    pub fn get(&self, kind: JobKind) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Kinds with a registered handler, in no particular order.
    pub fn kinds(&self) -> Vec<JobKind> {
        self.handlers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    #[async_trait]
    impl JobHandler for Nop {
        async fn handle(&self, _job: &Job) -> anyhow::Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    #[test]
    fn lookup_finds_only_registered_kinds() {
        let mut registry = HandlerRegistry::new();
        registry.register(JobKind::SyncCalls, Arc::new(Nop));

        assert!(registry.get(JobKind::SyncCalls).is_some());
        assert!(registry.get(JobKind::ProcessCall).is_none());
        assert_eq!(registry.kinds(), vec![JobKind::SyncCalls]);
    }

    #[test]
    fn register_replaces_the_previous_handler() {
        let mut registry = HandlerRegistry::new();
        let first: Arc<dyn JobHandler> = Arc::new(Nop);
        let second: Arc<dyn JobHandler> = Arc::new(Nop);
        registry.register(JobKind::SyncCalls, Arc::clone(&first));
        registry.register(JobKind::SyncCalls, Arc::clone(&second));

        let looked_up = registry.get(JobKind::SyncCalls).unwrap();
        assert!(Arc::ptr_eq(&looked_up, &second));
        assert_eq!(registry.kinds().len(), 1);
    }
}
