use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::disposition::AppliedDisposition;

/// Direction of a call as reported by the telephony vendor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

/// Vendor-level outcome of the call itself (not the business disposition).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    InProgress,
    Completed,
    NoAnswer,
    Busy,
    Voicemail,
    Failed,
}

impl CallStatus {
    /// True once the vendor considers the call over.
    pub fn is_ended(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// One of the three ordered pipeline steps tracked per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Transcription,
    Analysis,
    Disposition,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Analysis => "analysis",
            Self::Disposition => "disposition",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single pipeline step.
///
/// `Suggested`, `AutoApplied` and `ManualRequired` only occur on the
/// disposition step; the other steps end in `Completed`, `Failed` or
/// `Skipped`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
    Suggested,
    AutoApplied,
    ManualRequired,
}

impl StepStatus {
    /// True if the step reached a state that does not block the overall
    /// pipeline from being considered done.
    pub fn is_terminal_success(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Skipped | Self::Suggested | Self::AutoApplied | Self::ManualRequired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Suggested => "suggested",
            Self::AutoApplied => "auto_applied",
            Self::ManualRequired => "manual_required",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived status of the whole pipeline run for a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Per-call step tracking. The overall status is always derived, never
/// stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallProcessingState {
    pub transcription: StepStatus,
    pub analysis: StepStatus,
    pub disposition: StepStatus,
}

impl CallProcessingState {
    pub fn step(&self, step: PipelineStep) -> StepStatus {
        match step {
            PipelineStep::Transcription => self.transcription,
            PipelineStep::Analysis => self.analysis,
            PipelineStep::Disposition => self.disposition,
        }
    }

    pub fn set_step(&mut self, step: PipelineStep, status: StepStatus) {
        match step {
            PipelineStep::Transcription => self.transcription = status,
            PipelineStep::Analysis => self.analysis = status,
            PipelineStep::Disposition => self.disposition = status,
        }
    }

    /// Failed wins over processing: a failed step means the run is failed
    /// even if another step is still marked processing from a crashed run.
    pub fn overall(&self) -> OverallStatus {
        let steps = [self.transcription, self.analysis, self.disposition];
        if steps.iter().any(|s| *s == StepStatus::Failed) {
            OverallStatus::Failed
        } else if steps.iter().any(|s| *s == StepStatus::Processing) {
            OverallStatus::Processing
        } else if steps.iter().all(|s| s.is_terminal_success()) {
            OverallStatus::Completed
        } else {
            OverallStatus::Pending
        }
    }
}

/// A call as read through the persistence collaborator.
///
/// Only the fields this core reads or writes are modeled; the collaborator
/// owns the full schema.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    /// Telephony vendor session identifier, used to correlate webhook events.
    pub session_id: Option<String>,
    pub direction: CallDirection,
    pub status: CallStatus,
    pub duration_seconds: u32,
    pub recording_url: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processing: CallProcessingState,
    /// Set once a disposition has been applied or suggested for this call.
    pub disposition: Option<AppliedDisposition>,
}

impl CallRecord {
    pub fn has_recording(&self) -> bool {
        self.recording_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    pub fn has_ended(&self) -> bool {
        self.ended_at.is_some() || self.status.is_ended()
    }
}
