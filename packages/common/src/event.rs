use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Telephony vendor notification types this core routes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    CallStarted,
    CallConnected,
    CallEnded,
    CallDisconnected,
    RecordingReady,
    /// Vendor event types we do not act on. Kept so the record round-trips.
    #[serde(other)]
    Unknown,
}

impl WebhookEventKind {
    /// Kinds that describe a call session lifecycle change and therefore
    /// carry a telephony session id.
    pub fn is_call_session(&self) -> bool {
        matches!(
            self,
            Self::CallStarted | Self::CallConnected | Self::CallEnded | Self::CallDisconnected
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CallStarted => "call_started",
            Self::CallConnected => "call_connected",
            Self::CallEnded => "call_ended",
            Self::CallDisconnected => "call_disconnected",
            Self::RecordingReady => "recording_ready",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WebhookEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing status of a stored webhook event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Stored but not yet picked up.
    #[default]
    Received,
    Processing,
    Completed,
    Failed,
    Duplicate,
}

/// Fields of the vendor payload this core actually reads. The payload is
/// stored verbatim; this is a partial view of it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallSessionPayload {
    pub session_id: Option<String>,
    pub call_id: Option<String>,
    pub recording_url: Option<String>,
}

/// One inbound telephony notification as stored by the persistence
/// collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub kind: WebhookEventKind,
    pub raw_payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
    /// Terminal flag: once true the event is never reprocessed.
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub attempts: u32,
    pub related_call_id: Option<String>,
    pub error_message: Option<String>,
    /// Id of the original event when this one was classified a duplicate.
    pub duplicate_of: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    /// Wall-clock milliseconds the last processing attempt took.
    pub processing_ms: Option<u64>,
}

impl WebhookEvent {
    pub fn new(id: impl Into<String>, kind: WebhookEventKind, raw_payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            kind,
            raw_payload,
            received_at: Utc::now(),
            processed: false,
            status: EventStatus::Received,
            attempts: 0,
            related_call_id: None,
            error_message: None,
            duplicate_of: None,
            processed_at: None,
            processing_ms: None,
        }
    }

    /// Best-effort typed view of the raw payload. Vendor payloads vary, so
    /// missing fields simply come back `None`.
    pub fn session_payload(&self) -> CallSessionPayload {
        serde_json::from_value(self.raw_payload.clone()).unwrap_or_default()
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_payload().session_id
    }
}
