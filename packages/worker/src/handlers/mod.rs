//! Built-in handlers wiring queue jobs to the call pipeline.

mod calls;
mod disposition;
mod process;

pub use calls::SyncCallsHandler;
pub use disposition::EvaluateDispositionHandler;
pub use process::{AnalyzeCallHandler, ProcessCallHandler, TranscribeCallHandler};

use std::sync::Arc;

use common::collaborators::TelephonyClient;
use common::jobs::JobKind;
use pipeline::CallPipeline;

use crate::registry::HandlerRegistry;

/// Registry with every built-in handler wired to the given collaborators.
pub fn standard_registry(
    telephony: Arc<dyn TelephonyClient>,
    pipeline: Arc<CallPipeline>,
) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(JobKind::SyncCalls, Arc::new(SyncCallsHandler::new(telephony)));
    registry.register(
        JobKind::TranscribeCall,
        Arc::new(TranscribeCallHandler::new(Arc::clone(&pipeline))),
    );
    registry.register(
        JobKind::AnalyzeCall,
        Arc::new(AnalyzeCallHandler::new(Arc::clone(&pipeline))),
    );
    registry.register(
        JobKind::EvaluateDisposition,
        Arc::new(EvaluateDispositionHandler::new(pipeline.disposition_service())),
    );
    registry.register(JobKind::ProcessCall, Arc::new(ProcessCallHandler::new(pipeline)));
    registry
}
