//! Inbound telephony event processing: deduplication, routing to pipeline
//! triggers, and batch recovery of failed events.
//!
//! Every event is handled idempotently. Call-session events received twice
//! within thirty seconds for the same vendor session are classified as
//! duplicates and never trigger a second pipeline job. Handling failures
//! leave the event unprocessed so [`recover_failed`] can pick it up later.

pub mod error;
pub mod processor;
pub mod recovery;

pub use error::WebhookError;
pub use processor::{EventAction, EventOutcome, WebhookProcessor};
pub use recovery::{RECOVERY_CONCURRENCY, RecoveryOutcome, RecoverySummary, recover_failed};
