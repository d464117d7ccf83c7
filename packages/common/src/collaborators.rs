use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::analysis::{AnalysisModule, AnalysisReport};
use crate::call::{CallRecord, PipelineStep, StepStatus};
use crate::disposition::{AppliedDisposition, DispositionOutcome};
use crate::event::{WebhookEvent, WebhookEventKind};

/// Completed transcription of one call recording.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transcript {
    /// Reference under which the collaborator stored the transcript text.
    pub transcript_ref: String,
    pub word_count: u32,
    /// Recognizer confidence in 0.0..=1.0.
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("audio unavailable for call {0}")]
    AudioUnavailable(String),
    #[error("audio unintelligible for call {0}")]
    Unintelligible(String),
    #[error("transcription backend error: {0}")]
    Backend(String),
}

/// Speech-to-text backend boundary.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        call_id: &str,
        audio_ref: &str,
    ) -> Result<Transcript, TranscriptionError>;
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no transcript exists for call {0}")]
    MissingTranscript(String),
    #[error("analysis backend error: {0}")]
    Backend(String),
}

/// Language-model analysis backend boundary.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        call_id: &str,
        modules: &[AnalysisModule],
    ) -> Result<AnalysisReport, AnalysisError>;
}

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("telephony vendor error: {0}")]
    Vendor(String),
}

/// Telephony vendor integration boundary.
#[async_trait]
pub trait TelephonyClient: Send + Sync {
    /// Import calls ended within the given look-back window. Returns how
    /// many calls were imported.
    async fn sync_calls(&self, window: Duration) -> Result<u64, TelephonyError>;

    /// Look up a call by the vendor's session identifier.
    async fn call_by_session(&self, session_id: &str)
    -> Result<Option<CallRecord>, TelephonyError>;
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("persistence backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

/// Read/write access to call records through the persistence collaborator.
///
/// This is a deliberately narrow surface: the collaborator owns the schema
/// and all transactional guarantees.
#[async_trait]
pub trait CallRepository: Send + Sync {
    async fn call(&self, call_id: &str) -> Result<CallRecord, RepositoryError>;

    async fn set_step_status(
        &self,
        call_id: &str,
        step: PipelineStep,
        status: StepStatus,
    ) -> Result<(), RepositoryError>;

    /// Attach recording metadata delivered by a webhook.
    async fn update_recording(&self, call_id: &str, url: &str) -> Result<(), RepositoryError>;

    /// Stored analysis report for the call, if any run completed earlier.
    async fn analysis(&self, call_id: &str) -> Result<Option<AnalysisReport>, RepositoryError>;

    /// Persist the disposition now attached to the call.
    async fn apply_disposition(
        &self,
        call_id: &str,
        applied: &AppliedDisposition,
    ) -> Result<(), RepositoryError>;

    /// Append one evaluation to the call's disposition history.
    async fn append_disposition_history(
        &self,
        record: &DispositionHistoryRecord,
    ) -> Result<(), RepositoryError>;

    /// The configured outcome catalog the decision engine scores against.
    async fn outcomes(&self) -> Result<Vec<DispositionOutcome>, RepositoryError>;
}

/// One row of disposition history, written every time the engine produces a
/// decision for a call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispositionHistoryRecord {
    pub call_id: String,
    pub outcome: String,
    pub confidence: f64,
    pub action: String,
    /// Per-factor breakdown, serialized as produced by the engine.
    pub breakdown: serde_json::Value,
    pub evaluated_at: DateTime<Utc>,
}

/// Read/write access to webhook event records.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn event(&self, event_id: &str) -> Result<WebhookEvent, RepositoryError>;

    async fn update_event(&self, event: &WebhookEvent) -> Result<(), RepositoryError>;

    /// Events of the same kind received at or after `since`, excluding
    /// `exclude_id`. Used by duplicate detection.
    async fn recent_events(
        &self,
        kind: WebhookEventKind,
        since: DateTime<Utc>,
        exclude_id: &str,
    ) -> Result<Vec<WebhookEvent>, RepositoryError>;

    /// Unprocessed failed events received at or after `since` with fewer
    /// than `max_attempts` processing attempts, oldest first, capped at
    /// `limit`.
    async fn failed_events(
        &self,
        since: DateTime<Utc>,
        max_attempts: u32,
        limit: usize,
    ) -> Result<Vec<WebhookEvent>, RepositoryError>;
}
