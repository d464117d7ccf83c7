use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::config::QueueSettings;
use common::jobs::JobKind;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backoff::RetryPolicy;
use crate::error::QueueError;
use crate::job::{EnqueueOptions, Job, JobPriority, JobStatus, QueueStats};
use crate::keys::KeySpace;
use crate::store::JobStore;

/// Delayed jobs promoted per pass. Workers run the pass every poll, so a
/// backlog drains within a few polls.
const PROMOTE_BATCH: usize = 128;

/// Upper bound on records walked when building stats.
const STATS_SCAN_LIMIT: usize = 10_000;

/// Outcome of recording a handler failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// The job was parked in the delayed set for another attempt.
    Retry { attempt: u32, delay: Duration },
    /// Retries are used up and the job is now failed.
    Exhausted,
}

/// Job lifecycle manager over a [`JobStore`].
///
/// Producers enqueue and cancel; workers pop, claim, and settle. All
/// coordination between processes goes through the store, so any number of
/// queue instances can point at the same backend.
pub struct JobQueue {
    store: Arc<dyn JobStore>,
    keys: KeySpace,
    settings: QueueSettings,
    policy: RetryPolicy,
    retention: Duration,
}

impl JobQueue {
    pub fn new(
        store: Arc<dyn JobStore>,
        namespace: impl Into<String>,
        settings: QueueSettings,
    ) -> Self {
        let policy = RetryPolicy::new(&settings.backoff_secs);
        let retention = Duration::from_secs(settings.retention_secs);
        Self {
            store,
            keys: KeySpace::new(namespace),
            settings,
            policy,
            retention,
        }
    }

    /// Create a job record and make it available for pickup, immediately or
    /// after `opts.delay`.
    pub async fn enqueue(
        &self,
        kind: JobKind,
        payload: serde_json::Value,
        opts: EnqueueOptions,
    ) -> Result<Job, QueueError> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4().to_string(),
            kind,
            payload,
            priority: opts.priority,
            status: JobStatus::Queued,
            queued_at: now,
            started_at: None,
            completed_at: None,
            timeout_seconds: opts
                .timeout
                .map_or(self.settings.default_timeout_secs, |t| t.as_secs()),
            max_retries: opts.max_retries.unwrap_or(self.settings.default_max_retries),
            retry_count: 0,
            last_error: None,
            result: None,
            processing_ms: None,
            worker_id: None,
        };

        self.save(&job).await?;
        self.store
            .sorted_insert(&self.keys.index(), &job.id, millis(now))
            .await?;

        if opts.delay > Duration::ZERO {
            let due = millis(now) + opts.delay.as_millis() as f64;
            self.store
                .sorted_insert(&self.keys.delayed(), &job.id, due)
                .await?;
            debug!(
                job_id = %job.id,
                kind = %job.kind,
                delay_secs = opts.delay.as_secs(),
                "Enqueued delayed job"
            );
        } else {
            self.store
                .push_list(&self.keys.ready(job.priority), &job.id)
                .await?;
            debug!(job_id = %job.id, kind = %job.kind, priority = %job.priority, "Enqueued job");
        }

        Ok(job)
    }

    /// Current record for a job, or `None` once it has aged out.
    pub async fn job(&self, job_id: &str) -> Result<Option<Job>, QueueError> {
        self.load(job_id).await
    }

    /// Cancel a job that has not started. Only `queued` and `retrying` jobs
    /// can be cancelled; anything else returns `false`.
    pub async fn cancel(&self, job_id: &str) -> Result<bool, QueueError> {
        let Some(mut job) = self.load(job_id).await? else {
            return Ok(false);
        };
        if !matches!(job.status, JobStatus::Queued | JobStatus::Retrying) {
            return Ok(false);
        }

        // Best-effort removal from whichever structure holds the id. A
        // worker that pops the id concurrently will overwrite this record
        // when it claims the job.
        let removed = self
            .store
            .remove_list(&self.keys.ready(job.priority), &job.id)
            .await?;
        if !removed {
            self.store
                .sorted_remove(&self.keys.delayed(), &job.id)
                .await?;
        }

        job.status = JobStatus::Cancelled;
        job.completed_at = Some(Utc::now());
        self.save(&job).await?;
        info!(job_id = %job.id, "Cancelled job");
        Ok(true)
    }

    /// Block up to `timeout` for the next ready job, highest priority tier
    /// first. Returns `None` on timeout, and also when the popped id turns
    /// out to have no live record or a terminal one.
    pub async fn next_job(&self, timeout: Duration) -> Result<Option<Job>, QueueError> {
        let Some((_, job_id)) = self.store.pop_list(&self.keys.ready_keys(), timeout).await? else {
            return Ok(None);
        };
        match self.load(&job_id).await? {
            Some(job) if job.status.is_terminal() => {
                debug!(job_id = %job.id, status = %job.status, "Skipping job in terminal state");
                Ok(None)
            }
            Some(job) => Ok(Some(job)),
            None => {
                warn!(job_id = %job_id, "Popped job id with missing record, skipping");
                Ok(None)
            }
        }
    }

    /// Claim a popped job for a worker before its handler runs.
    pub async fn mark_processing(&self, job: &mut Job, worker_id: &str) -> Result<(), QueueError> {
        job.status = JobStatus::Processing;
        job.started_at = Some(Utc::now());
        job.worker_id = Some(worker_id.to_string());
        self.save(job).await
    }

    /// Settle a job whose handler succeeded.
    pub async fn complete(
        &self,
        job: &mut Job,
        result: serde_json::Value,
    ) -> Result<(), QueueError> {
        let now = Utc::now();
        job.status = JobStatus::Completed;
        job.completed_at = Some(now);
        job.processing_ms = elapsed_ms(job.started_at, now);
        job.result = Some(result);
        job.last_error = None;
        self.save(job).await
    }

    /// Settle a job whose handler failed, scheduling a retry if any remain.
    pub async fn fail(&self, job: &mut Job, error: &str) -> Result<RetryDecision, QueueError> {
        let now = Utc::now();
        job.last_error = Some(error.to_string());

        if job.retry_count < job.max_retries {
            job.retry_count += 1;
            let attempt = job.retry_count;
            let delay = self.policy.delay_for_attempt(attempt);
            job.status = JobStatus::Retrying;
            self.save(job).await?;

            let due = millis(now) + delay.as_millis() as f64;
            self.store
                .sorted_insert(&self.keys.delayed(), &job.id, due)
                .await?;
            info!(
                job_id = %job.id,
                attempt,
                delay_secs = delay.as_secs(),
                error,
                "Retrying job"
            );
            Ok(RetryDecision::Retry { attempt, delay })
        } else {
            job.status = JobStatus::Failed;
            job.completed_at = Some(now);
            job.processing_ms = elapsed_ms(job.started_at, now);
            self.save(job).await?;
            warn!(job_id = %job.id, retries = job.retry_count, error, "Job failed permanently");
            Ok(RetryDecision::Exhausted)
        }
    }

    /// Move due jobs from the delayed set into their ready lists. Safe to
    /// run from any number of workers concurrently.
    pub async fn promote_due(&self) -> Result<u32, QueueError> {
        self.promote_due_at(Utc::now()).await
    }

    async fn promote_due_at(&self, now: DateTime<Utc>) -> Result<u32, QueueError> {
        let due = self
            .store
            .sorted_range_by_score(&self.keys.delayed(), millis(now), PROMOTE_BATCH)
            .await?;

        let mut promoted = 0;
        for job_id in due {
            // The remove doubles as the claim when several workers promote
            // the same pass.
            if !self.store.sorted_remove(&self.keys.delayed(), &job_id).await? {
                continue;
            }
            match self.load(&job_id).await? {
                Some(job) => {
                    self.store
                        .push_list(&self.keys.ready(job.priority), &job_id)
                        .await?;
                    promoted += 1;
                }
                None => {
                    debug!(job_id = %job_id, "Dropping delayed job whose record expired");
                }
            }
        }

        if promoted > 0 {
            debug!(promoted, "Promoted delayed jobs");
        }
        Ok(promoted)
    }

    /// Queue depth per tier, delayed count, and a status histogram over the
    /// retained records. Index entries whose record has expired are pruned
    /// as a side effect, keeping the scan bounded.
    pub async fn stats(&self) -> Result<QueueStats, QueueError> {
        let mut stats = QueueStats::default();

        for priority in JobPriority::ALL {
            let len = self.store.list_len(&self.keys.ready(priority)).await?;
            stats.ready.insert(priority, len);
        }
        stats.delayed = self.store.sorted_len(&self.keys.delayed()).await?;

        let ids = self
            .store
            .sorted_range_by_score(&self.keys.index(), f64::MAX, STATS_SCAN_LIMIT)
            .await?;
        for job_id in ids {
            match self.load(&job_id).await? {
                Some(job) => *stats.statuses.entry(job.status).or_insert(0) += 1,
                None => {
                    self.store.sorted_remove(&self.keys.index(), &job_id).await?;
                }
            }
        }

        Ok(stats)
    }

    async fn save(&self, job: &Job) -> Result<(), QueueError> {
        let raw = serde_json::to_string(job)?;
        self.store
            .put_record(&self.keys.record(&job.id), &raw, self.retention)
            .await?;
        Ok(())
    }

    async fn load(&self, job_id: &str) -> Result<Option<Job>, QueueError> {
        let Some(raw) = self.store.get_record(&self.keys.record(job_id)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

fn millis(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64
}

fn elapsed_ms(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<u64> {
    started_at.map(|s| (now - s).num_milliseconds().max(0) as u64)
}
