use common::collaborators::{RepositoryError, TelephonyError};
use jobq::QueueError;
use pipeline::PipelineError;
use thiserror::Error;

/// Failures while handling one webhook event.
///
/// Inside [`crate::WebhookProcessor::process_event`] these are caught and
/// recorded on the event itself; they only escape to the caller when the
/// event record cannot be loaded or its status cannot be written back.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("persistence error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("telephony error: {0}")]
    Telephony(#[from] TelephonyError),

    #[error("pipeline enqueue failed: {0}")]
    Queue(#[from] QueueError),

    #[error("disposition evaluation failed: {0}")]
    Disposition(#[from] PipelineError),

    #[error("job payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("event payload carries no session id")]
    MissingSessionId,

    #[error("recording event carries no recording url")]
    MissingRecordingUrl,

    #[error("no call found for session {0}")]
    CallNotFound(String),
}
