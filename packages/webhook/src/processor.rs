use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use common::call::CallRecord;
use common::collaborators::{CallRepository, EventRepository, TelephonyClient};
use common::event::{EventStatus, WebhookEvent, WebhookEventKind};
use common::jobs::{JobKind, ProcessCallJob};
use jobq::{EnqueueOptions, JobPriority, JobQueue};
use pipeline::DispositionService;
use tracing::{debug, info, warn};

use crate::error::WebhookError;

/// Same-kind events this far back are candidates for duplicate detection.
const DEDUP_WINDOW_MINUTES: i64 = 10;

/// Two call-session events for the same session closer together than this
/// are one delivery, not two calls.
const DEDUP_SPREAD_SECONDS: i64 = 30;

/// Look-back for the on-demand telephony resync when a session has no
/// local call record yet.
const RESYNC_WINDOW: Duration = Duration::from_secs(3600);

/// What routing did for an event that was handled successfully.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventAction {
    /// A high-priority full-pipeline job was enqueued.
    PipelineEnqueued { job_id: String },
    /// The call had no recording; the rule-based disposition ran inline.
    BasicDisposition,
    /// Lifecycle bookkeeping only, no processing triggered.
    Recorded,
    /// Recording metadata stored; the pipeline waits for the call to end.
    Deferred,
    /// Vendor event kind this core does not act on.
    Ignored,
}

/// Terminal result of [`WebhookProcessor::process_event`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was already processed earlier; nothing was done.
    AlreadyProcessed,
    /// The event was handled and marked completed.
    Completed(EventAction),
    /// The event duplicates an earlier one and was discarded.
    Duplicate { original: String },
    /// Handling failed; the event stays unprocessed for later recovery.
    Failed { error: String },
}

enum Handled {
    Duplicate { original: String },
    Acted(EventAction),
}

/// Takes stored webhook events through dedup and routing, then persists
/// the terminal status.
///
/// All handling failures are recorded on the event itself; the returned
/// `Err` is reserved for failures to load or write the event record.
pub struct WebhookProcessor {
    events: Arc<dyn EventRepository>,
    calls: Arc<dyn CallRepository>,
    telephony: Arc<dyn TelephonyClient>,
    queue: Arc<JobQueue>,
    disposition: Arc<DispositionService>,
}

impl WebhookProcessor {
    pub fn new(
        events: Arc<dyn EventRepository>,
        calls: Arc<dyn CallRepository>,
        telephony: Arc<dyn TelephonyClient>,
        queue: Arc<JobQueue>,
        disposition: Arc<DispositionService>,
    ) -> Self {
        Self {
            events,
            calls,
            telephony,
            queue,
            disposition,
        }
    }

    pub(crate) fn events_repo(&self) -> Arc<dyn EventRepository> {
        Arc::clone(&self.events)
    }

    /// Handle one stored event. Safe to call repeatedly: a processed event
    /// is never handled twice.
    pub async fn process_event(&self, event_id: &str) -> Result<EventOutcome, WebhookError> {
        let mut event = self.events.event(event_id).await?;
        if event.processed {
            debug!(event_id, "Event already processed, skipping");
            return Ok(EventOutcome::AlreadyProcessed);
        }

        let started = Instant::now();
        event.status = EventStatus::Processing;
        event.attempts += 1;
        self.events.update_event(&event).await?;

        let outcome = match self.handle(&mut event).await {
            Ok(Handled::Duplicate { original }) => {
                event.processed = true;
                event.status = EventStatus::Duplicate;
                event.duplicate_of = Some(original.clone());
                event.error_message = None;
                event.processed_at = Some(Utc::now());
                info!(
                    event_id,
                    kind = %event.kind,
                    original = %original,
                    "Duplicate event discarded"
                );
                EventOutcome::Duplicate { original }
            }
            Ok(Handled::Acted(action)) => {
                event.processed = true;
                event.status = EventStatus::Completed;
                event.error_message = None;
                event.processed_at = Some(Utc::now());
                info!(event_id, kind = %event.kind, action = ?action, "Event processed");
                EventOutcome::Completed(action)
            }
            Err(err) => {
                let error = err.to_string();
                event.processed = false;
                event.status = EventStatus::Failed;
                event.error_message = Some(error.clone());
                warn!(
                    event_id,
                    kind = %event.kind,
                    attempts = event.attempts,
                    error = %error,
                    "Event handling failed, left for recovery"
                );
                EventOutcome::Failed { error }
            }
        };
        event.processing_ms = Some(started.elapsed().as_millis() as u64);
        self.events.update_event(&event).await?;
        Ok(outcome)
    }

    async fn handle(&self, event: &mut WebhookEvent) -> Result<Handled, WebhookError> {
        if let Some(original) = self.find_duplicate(event).await? {
            return Ok(Handled::Duplicate { original });
        }
        let action = self.route(event).await?;
        Ok(Handled::Acted(action))
    }

    /// Duplicate detection for call-session events: same kind, same vendor
    /// session, received less than thirty seconds apart. Only events that
    /// finished processing count, so two events racing through here at the
    /// same instant can both pass.
    async fn find_duplicate(
        &self,
        event: &WebhookEvent,
    ) -> Result<Option<String>, WebhookError> {
        if !event.kind.is_call_session() {
            return Ok(None);
        }
        let Some(session_id) = event.session_id() else {
            return Ok(None);
        };

        let since = event.received_at - chrono::Duration::minutes(DEDUP_WINDOW_MINUTES);
        let candidates = self
            .events
            .recent_events(event.kind, since, &event.id)
            .await?;
        let original = candidates
            .into_iter()
            .filter(|c| c.processed)
            .filter(|c| c.session_id().as_deref() == Some(session_id.as_str()))
            .filter(|c| {
                (c.received_at - event.received_at).num_seconds().abs() < DEDUP_SPREAD_SECONDS
            })
            .min_by_key(|c| c.received_at)
            .map(|c| c.id);
        Ok(original)
    }

    async fn route(&self, event: &mut WebhookEvent) -> Result<EventAction, WebhookError> {
        match event.kind {
            WebhookEventKind::CallEnded | WebhookEventKind::CallDisconnected => {
                self.call_ended(event).await
            }
            WebhookEventKind::CallStarted | WebhookEventKind::CallConnected => {
                debug!(event_id = %event.id, kind = %event.kind, "Lifecycle event recorded");
                Ok(EventAction::Recorded)
            }
            WebhookEventKind::RecordingReady => self.recording_ready(event).await,
            WebhookEventKind::Unknown => {
                debug!(event_id = %event.id, "Unhandled vendor event kind, ignoring");
                Ok(EventAction::Ignored)
            }
        }
    }

    /// A call is over: with a recording the full pipeline runs as a job,
    /// without one only the rule-based disposition applies.
    async fn call_ended(&self, event: &mut WebhookEvent) -> Result<EventAction, WebhookError> {
        let session_id = event.session_id().ok_or(WebhookError::MissingSessionId)?;
        let call = self
            .locate_call(&session_id)
            .await?
            .ok_or_else(|| WebhookError::CallNotFound(session_id.clone()))?;
        event.related_call_id = Some(call.id.clone());

        if call.has_recording() {
            let job_id = self.enqueue_pipeline(&call.id).await?;
            Ok(EventAction::PipelineEnqueued { job_id })
        } else {
            let result = self.disposition.evaluate_loaded(&call, None, false).await?;
            info!(
                call_id = %call.id,
                result = ?result,
                "Call ended without recording, basic disposition ran"
            );
            Ok(EventAction::BasicDisposition)
        }
    }

    /// Store the recording reference and start the pipeline if the call has
    /// already ended; otherwise the call-ended event will pick it up.
    async fn recording_ready(
        &self,
        event: &mut WebhookEvent,
    ) -> Result<EventAction, WebhookError> {
        let payload = event.session_payload();
        let url = payload
            .recording_url
            .ok_or(WebhookError::MissingRecordingUrl)?;

        let call = match (payload.call_id, payload.session_id) {
            (Some(call_id), _) => self.calls.call(&call_id).await?,
            (None, Some(session_id)) => self
                .locate_call(&session_id)
                .await?
                .ok_or_else(|| WebhookError::CallNotFound(session_id.clone()))?,
            (None, None) => return Err(WebhookError::MissingSessionId),
        };
        event.related_call_id = Some(call.id.clone());
        self.calls.update_recording(&call.id, &url).await?;

        if call.has_ended() {
            let job_id = self.enqueue_pipeline(&call.id).await?;
            Ok(EventAction::PipelineEnqueued { job_id })
        } else {
            debug!(call_id = %call.id, "Recording stored before call end, pipeline deferred");
            Ok(EventAction::Deferred)
        }
    }

    /// Session lookup with one narrow resync attempt when the call has not
    /// been imported yet.
    async fn locate_call(&self, session_id: &str) -> Result<Option<CallRecord>, WebhookError> {
        if let Some(call) = self.telephony.call_by_session(session_id).await? {
            return Ok(Some(call));
        }
        info!(session_id, "Session has no local call, resyncing from vendor");
        let imported = self.telephony.sync_calls(RESYNC_WINDOW).await?;
        debug!(session_id, imported, "Resync finished");
        Ok(self.telephony.call_by_session(session_id).await?)
    }

    async fn enqueue_pipeline(&self, call_id: &str) -> Result<String, WebhookError> {
        let payload = serde_json::to_value(ProcessCallJob {
            call_id: call_id.to_string(),
        })?;
        let job = self
            .queue
            .enqueue(
                JobKind::ProcessCall,
                payload,
                EnqueueOptions::with_priority(JobPriority::High),
            )
            .await?;
        info!(call_id, job_id = %job.id, "Pipeline job enqueued");
        Ok(job.id)
    }
}
