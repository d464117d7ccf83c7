pub mod analysis;
pub mod call;
pub mod collaborators;
pub mod config;
pub mod disposition;
pub mod event;
pub mod jobs;

pub use analysis::{AnalysisModule, AnalysisReport, EscalationRisk, Sentiment};
pub use call::{
    CallDirection, CallProcessingState, CallRecord, CallStatus, OverallStatus, PipelineStep,
    StepStatus,
};
pub use disposition::{
    AppliedDisposition, AutoApplyConditions, DispositionOutcome, DispositionSource,
    OutcomeCategory,
};
pub use event::{CallSessionPayload, EventStatus, WebhookEvent, WebhookEventKind};
pub use jobs::JobKind;
