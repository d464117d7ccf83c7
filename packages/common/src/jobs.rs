use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of background job kinds this system dispatches on.
///
/// Producers may enqueue any kind at any time; whether a handler is
/// registered for it is only checked at dispatch, so a worker running an
/// older registry fails the job through the normal retry policy instead of
/// rejecting the enqueue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Import recent calls from the telephony vendor.
    SyncCalls,
    /// Transcribe one call recording.
    TranscribeCall,
    /// Run the analysis backend over one transcribed call.
    AnalyzeCall,
    /// Full pipeline for one call: transcription, analysis, disposition.
    ProcessCall,
    /// Disposition evaluation only, for calls already analyzed.
    EvaluateDisposition,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SyncCalls => "sync_calls",
            Self::TranscribeCall => "transcribe_call",
            Self::AnalyzeCall => "analyze_call",
            Self::ProcessCall => "process_call",
            Self::EvaluateDisposition => "evaluate_disposition",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for [`JobKind::SyncCalls`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncCallsJob {
    /// How far back to ask the vendor for calls.
    pub window_minutes: u32,
}

/// Payload for [`JobKind::TranscribeCall`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscribeCallJob {
    pub call_id: String,
}

/// Payload for [`JobKind::AnalyzeCall`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzeCallJob {
    pub call_id: String,
}

/// Payload for [`JobKind::ProcessCall`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessCallJob {
    pub call_id: String,
}

/// Payload for [`JobKind::EvaluateDisposition`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluateDispositionJob {
    pub call_id: String,
    #[serde(default)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&JobKind::TranscribeCall).unwrap();
        assert_eq!(json, "\"transcribe_call\"");
        let kind: JobKind = serde_json::from_str("\"process_call\"").unwrap();
        assert_eq!(kind, JobKind::ProcessCall);
    }
}
