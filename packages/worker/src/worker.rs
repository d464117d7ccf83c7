use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use jobq::{Job, JobQueue, QueueError, RetryDecision};
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::registry::HandlerRegistry;

/// A single claim-execute-settle loop over the shared queue.
///
/// Workers are independent; run several against the same store for
/// parallelism. A handler failure, timeout, or panic settles the job
/// through the retry schedule and the loop moves on. Only errors from the
/// store itself make the worker pause.
pub struct Worker {
    id: String,
    queue: Arc<JobQueue>,
    registry: Arc<HandlerRegistry>,
    poll_interval: Duration,
    jitter: Duration,
    drain_when_idle: bool,
}

impl Worker {
    pub fn new(
        id: impl Into<String>,
        queue: Arc<JobQueue>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            id: id.into(),
            queue,
            registry,
            poll_interval: Duration::from_secs(5),
            jitter: Duration::from_millis(100),
            drain_when_idle: false,
        }
    }

    /// Override how long each pop blocks waiting for a ready job.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the upper bound on the random pause after a store error.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Exit once the queue has nothing ready instead of waiting for more.
    pub fn drain_when_idle(mut self, drain: bool) -> Self {
        self.drain_when_idle = drain;
        self
    }

    /// Run until `shutdown` flips to true, or the queue empties in drain
    /// mode. A job in flight always settles before the worker stops, so
    /// shutdown latency is bounded by the slowest handler plus one poll
    /// interval.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(worker_id = %self.id, "Worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.run_next_job().await {
                Ok(Some(job_id)) => {
                    debug!(worker_id = %self.id, job_id = %job_id, "Job settled");
                }
                Ok(None) if self.drain_when_idle => {
                    info!(worker_id = %self.id, "Queue drained");
                    break;
                }
                // The pop already blocked for the poll interval, so an
                // empty queue goes straight into the next iteration.
                Ok(None) => {}
                Err(e) => {
                    error!(worker_id = %self.id, error = %e, "Queue error, backing off");
                    // Jittered pause so workers sharing a struggling store
                    // do not retry in lockstep.
                    tokio::select! {
                        _ = tokio::time::sleep(self.error_pause()) => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }
        }
        info!(worker_id = %self.id, "Worker stopped");
    }

    /// Claim and settle at most one job. Returns the settled job's id, or
    /// `None` when nothing came ready within the poll interval.
    async fn run_next_job(&self) -> Result<Option<String>, QueueError> {
        self.queue.promote_due().await?;

        let Some(mut job) = self.queue.next_job(self.poll_interval).await? else {
            return Ok(None);
        };

        self.queue.mark_processing(&mut job, &self.id).await?;
        info!(
            worker_id = %self.id,
            job_id = %job.id,
            kind = %job.kind,
            attempt = job.retry_count + 1,
            "Processing job"
        );

        match self.execute(&job).await {
            Ok(result) => {
                self.queue.complete(&mut job, result).await?;
                info!(
                    worker_id = %self.id,
                    job_id = %job.id,
                    processing_ms = job.processing_ms,
                    "Job completed"
                );
            }
            Err(message) => match self.queue.fail(&mut job, &message).await? {
                RetryDecision::Retry { attempt, delay } => warn!(
                    worker_id = %self.id,
                    job_id = %job.id,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %message,
                    "Job failed, retry scheduled"
                ),
                RetryDecision::Exhausted => error!(
                    worker_id = %self.id,
                    job_id = %job.id,
                    retries = job.retry_count,
                    error = %message,
                    "Job failed, retries exhausted"
                ),
            },
        }

        Ok(Some(job.id))
    }

    /// Run the job's handler under its deadline. Panics are caught so one
    /// bad handler settles its job instead of killing the loop.
    async fn execute(&self, job: &Job) -> Result<serde_json::Value, String> {
        let Some(handler) = self.registry.get(job.kind) else {
            return Err(format!("no handler registered for job kind {}", job.kind));
        };

        let work = AssertUnwindSafe(handler.handle(job)).catch_unwind();
        match tokio::time::timeout(job.timeout(), work).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(err))) => Err(format!("{err:#}")),
            Ok(Err(panic)) => Err(panic_message(panic.as_ref())),
            Err(_) => Err(format!("timed out after {}s", job.timeout_seconds)),
        }
    }

    fn error_pause(&self) -> Duration {
        let cap = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(0..=cap))
    }
}

/// Best-effort text from a panic payload.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}
