use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::error::WebhookError;
use crate::processor::{EventOutcome, WebhookProcessor};

/// Concurrency cap for one recovery sweep. Recovery competes with live
/// traffic, so it stays small.
pub const RECOVERY_CONCURRENCY: usize = 3;

/// Events that failed this many times are left failed for good.
const MAX_EVENT_ATTEMPTS: u32 = 3;

/// How reprocessing one recovered event ended. Hard errors are carried as
/// text; the typed error was already logged where it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryOutcome {
    pub event_id: String,
    pub result: Result<EventOutcome, String>,
}

/// Aggregate of one recovery sweep.
#[derive(Debug, Default)]
pub struct RecoverySummary {
    /// Failed events picked up by the sweep.
    pub scanned: usize,
    /// Reprocessed to completion, including events another worker finished
    /// in the meantime.
    pub completed: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub outcomes: Vec<RecoveryOutcome>,
}

/// Reprocess events that failed within the last `hours_back` hours and
/// still have attempts left, at most `max_events` of them, bounded by
/// [`RECOVERY_CONCURRENCY`] concurrent handlers.
pub async fn recover_failed(
    processor: Arc<WebhookProcessor>,
    hours_back: u32,
    max_events: usize,
) -> Result<RecoverySummary, WebhookError> {
    let since = Utc::now() - Duration::hours(i64::from(hours_back));
    let failed = processor
        .events_repo()
        .failed_events(since, MAX_EVENT_ATTEMPTS, max_events)
        .await?;

    let mut summary = RecoverySummary {
        scanned: failed.len(),
        ..Default::default()
    };
    info!(
        scanned = summary.scanned,
        hours_back, max_events, "Starting webhook event recovery"
    );

    let permits = Arc::new(Semaphore::new(RECOVERY_CONCURRENCY));
    let mut handles = Vec::with_capacity(failed.len());
    for event in failed {
        let processor = Arc::clone(&processor);
        let permits = Arc::clone(&permits);
        let event_id = event.id;
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = processor
                .process_event(&event_id)
                .await
                .map_err(|err| err.to_string());
            RecoveryOutcome { event_id, result }
        }));
    }

    for handle in handles {
        match handle.await {
            Ok(outcome) => {
                match &outcome.result {
                    Ok(EventOutcome::Completed(_)) | Ok(EventOutcome::AlreadyProcessed) => {
                        summary.completed += 1;
                    }
                    Ok(EventOutcome::Duplicate { .. }) => summary.duplicates += 1,
                    Ok(EventOutcome::Failed { .. }) | Err(_) => summary.failed += 1,
                }
                summary.outcomes.push(outcome);
            }
            Err(err) => {
                summary.failed += 1;
                error!(error = %err, "Recovery task aborted");
            }
        }
    }

    info!(
        scanned = summary.scanned,
        completed = summary.completed,
        duplicates = summary.duplicates,
        failed = summary.failed,
        "Webhook event recovery finished"
    );
    Ok(summary)
}
