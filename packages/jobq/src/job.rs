use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::jobs::JobKind;
use serde::{Deserialize, Serialize};

/// Scheduling tier for a job. Workers always drain higher tiers before
/// looking at lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl JobPriority {
    /// All tiers in pop order, most urgent first.
    pub const ALL: [JobPriority; 4] = [
        JobPriority::Urgent,
        JobPriority::High,
        JobPriority::Medium,
        JobPriority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobPriority::Urgent => "urgent",
            JobPriority::High => "high",
            JobPriority::Medium => "medium",
            JobPriority::Low => "low",
        }
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Retrying,
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Retrying => "retrying",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistent job record. The record is the source of truth for a job's
/// lifecycle; the ready lists and delayed set only hold its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub payload: serde_json::Value,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub result: Option<serde_json::Value>,
    pub processing_ms: Option<u64>,
    pub worker_id: Option<String>,
}

impl Job {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Knobs for a single enqueue call. Unset fields fall back to the queue's
/// configured defaults.
#[derive(Debug, Clone)]
pub struct EnqueueOptions {
    pub priority: JobPriority,
    pub delay: Duration,
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        Self {
            priority: JobPriority::Medium,
            delay: Duration::ZERO,
            timeout: None,
            max_retries: None,
        }
    }
}

impl EnqueueOptions {
    pub fn with_priority(priority: JobPriority) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

/// Point-in-time queue counters for monitoring endpoints.
#[derive(Debug, Default, Serialize)]
pub struct QueueStats {
    /// Jobs waiting in each ready list.
    pub ready: HashMap<JobPriority, u64>,
    /// Jobs parked in the delayed set.
    pub delayed: u64,
    /// Lifecycle histogram across all retained job records.
    pub statuses: HashMap<JobStatus, u64>,
}
