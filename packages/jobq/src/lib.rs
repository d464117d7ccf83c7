//! Background job queue built on a Redis-shaped store.
//!
//! Jobs are JSON records with a 24 hour retention window. Ready jobs sit in
//! one list per priority tier; delayed and retrying jobs wait in a sorted
//! set keyed by their earliest execution time until a promotion pass moves
//! them into a ready list.

pub mod backoff;
pub mod error;
pub mod job;
pub mod keys;
pub mod queue;
pub mod store;

pub use backoff::RetryPolicy;
pub use error::QueueError;
pub use job::{EnqueueOptions, Job, JobPriority, JobStatus, QueueStats};
pub use keys::KeySpace;
pub use queue::{JobQueue, RetryDecision};
pub use store::{JobStore, MemoryStore, RedisStore, StoreError};
