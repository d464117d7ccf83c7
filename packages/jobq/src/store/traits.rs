use std::time::Duration;

use async_trait::async_trait;

use super::error::StoreError;

/// Primitive operations the queue needs from its backing store: FIFO lists,
/// score-ordered sets, and expiring string records.
///
/// The production implementation is [`super::RedisStore`];
/// [`super::MemoryStore`] covers tests and single-process deployments.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Append a member to a list. Members pop back out in push order.
    async fn push_list(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Pop the oldest member of the first non-empty list in `keys`, blocking
    /// up to `timeout` for one to appear. Returns the key the member came
    /// from.
    async fn pop_list(
        &self,
        keys: &[String],
        timeout: Duration,
    ) -> Result<Option<(String, String)>, StoreError>;

    /// Remove the oldest occurrence of a member from a list. Returns whether
    /// anything was removed.
    async fn remove_list(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn list_len(&self, key: &str) -> Result<u64, StoreError>;

    /// Insert a member with a score, replacing any previous score.
    async fn sorted_insert(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError>;

    /// Members with score at most `max_score`, lowest first, capped at
    /// `limit`.
    async fn sorted_range_by_score(
        &self,
        key: &str,
        max_score: f64,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;

    /// Remove a member. Returns whether it was present, which doubles as an
    /// atomic claim when several callers race for the same member.
    async fn sorted_remove(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn sorted_len(&self, key: &str) -> Result<u64, StoreError>;

    /// Write a string record that the store drops after `ttl`.
    async fn put_record(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn get_record(&self, key: &str) -> Result<Option<String>, StoreError>;
}
