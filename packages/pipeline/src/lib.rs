//! Per-call processing pipeline: transcription, analysis, then a
//! disposition decision, with strict ordering and short-circuit on failure.
//!
//! Calls without a recording take a reduced path that goes straight to the
//! rule-based disposition. Batch runs bound their concurrency with a
//! counting semaphore so collaborator backends are never flooded.

pub mod batch;
pub mod error;
pub mod pipeline;
pub mod service;

pub use batch::{BatchSummary, DEFAULT_BATCH_CONCURRENCY, run_batch};
pub use error::PipelineError;
pub use pipeline::{CallPipeline, PipelineReport, StepOutcome};
pub use service::{DispositionResult, DispositionService};
