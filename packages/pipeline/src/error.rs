use common::collaborators::RepositoryError;
use disposition::EngineError;
use thiserror::Error;

/// Errors that escape a pipeline run. Collaborator step failures do not
/// appear here; they become step statuses on the call instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("persistence error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("decision engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("decision serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
