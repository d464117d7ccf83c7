use thiserror::Error;

/// Structural configuration and input errors. These surface at startup
/// validation, never during routine call evaluation.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("scoring weights must sum to 100, got {0}")]
    InvalidWeights(f64),

    #[error("scoring weight cannot be negative: {0}")]
    NegativeWeight(f64),

    #[error("threshold {0} is outside the 0..=100 confidence scale")]
    ThresholdOutOfRange(f64),

    #[error("auto-apply threshold {auto_apply} must be above suggest threshold {suggest}")]
    ThresholdsNotMonotonic { auto_apply: f64, suggest: f64 },

    #[error("no candidate outcomes configured")]
    NoCandidates,
}
