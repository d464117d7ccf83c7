use std::sync::Arc;

use futures::future::join_all;
use jobq::JobQueue;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::WorkerSettings;
use crate::registry::HandlerRegistry;
use crate::worker::Worker;

/// A configured set of workers sharing one queue and one registry.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    registry: Arc<HandlerRegistry>,
    settings: WorkerSettings,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<JobQueue>,
        registry: Arc<HandlerRegistry>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            registry,
            settings,
        }
    }

    /// Spawn the workers and hand back the switch that stops them.
    pub fn start(self) -> PoolHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let count = self.settings.count.max(1);
        let mut handles = Vec::with_capacity(count);
        for n in 1..=count {
            let worker = Worker::new(
                format!("{}-{n}", self.settings.id_prefix),
                Arc::clone(&self.queue),
                Arc::clone(&self.registry),
            )
            .poll_interval(self.settings.poll_interval())
            .jitter(self.settings.jitter())
            .drain_when_idle(self.settings.drain_when_idle);
            handles.push(tokio::spawn(worker.run(shutdown_rx.clone())));
        }
        info!(workers = count, "Worker pool started");
        PoolHandle {
            shutdown: shutdown_tx,
            handles,
        }
    }
}

/// Running pool plus the shutdown switch.
pub struct PoolHandle {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl PoolHandle {
    /// Tell every worker to stop after its current job.
    pub fn shutdown(&self) {
        // Send only fails when every receiver is gone, which means the
        // workers have already stopped.
        let _ = self.shutdown.send(true);
    }

    /// Wait for every worker loop to return.
    pub async fn wait(self) {
        for outcome in join_all(self.handles).await {
            if let Err(e) = outcome {
                warn!(error = %e, "Worker task ended abnormally");
            }
        }
        info!("Worker pool stopped");
    }

    /// Stop the pool and wait for it to wind down.
    pub async fn stop(self) {
        self.shutdown();
        self.wait().await;
    }
}
