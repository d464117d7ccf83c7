use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::error::StoreError;
use super::traits::JobStore;

struct ExpiringValue {
    value: String,
    expires_at: Instant,
}

/// In-memory job store for tests and single-process deployments.
///
/// Every operation matches the Redis semantics the queue relies on,
/// including the blocking pop and record expiry.
#[derive(Default)]
pub struct MemoryStore {
    lists: DashMap<String, VecDeque<String>>,
    sorted: DashMap<String, HashMap<String, f64>>,
    records: DashMap<String, ExpiringValue>,
    push_signal: Notify,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_pop(&self, keys: &[String]) -> Option<(String, String)> {
        for key in keys {
            if let Some(mut list) = self.lists.get_mut(key) {
                if let Some(member) = list.pop_front() {
                    return Some((key.clone(), member));
                }
            }
        }
        None
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn push_list(&self, key: &str, member: &str) -> Result<(), StoreError> {
        self.lists
            .entry(key.to_string())
            .or_default()
            .push_back(member.to_string());
        self.push_signal.notify_waiters();
        Ok(())
    }

    async fn pop_list(
        &self,
        keys: &[String],
        timeout: Duration,
    ) -> Result<Option<(String, String)>, StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register for the push signal before checking the lists, so a
            // push landing between the check and the wait still wakes us.
            let notified = self.push_signal.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(entry) = self.try_pop(keys) {
                return Ok(Some(entry));
            }

            tokio::select! {
                _ = notified.as_mut() => {}
                _ = tokio::time::sleep_until(deadline) => return Ok(None),
            }
        }
    }

    async fn remove_list(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let removed = match self.lists.get_mut(key) {
            Some(mut list) => match list.iter().position(|m| m == member) {
                Some(idx) => {
                    list.remove(idx);
                    true
                }
                None => false,
            },
            None => false,
        };
        Ok(removed)
    }

    async fn list_len(&self, key: &str) -> Result<u64, StoreError> {
        Ok(self.lists.get(key).map_or(0, |list| list.len() as u64))
    }

    async fn sorted_insert(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        self.sorted
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn sorted_range_by_score(
        &self,
        key: &str,
        max_score: f64,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let mut matches: Vec<(f64, String)> = match self.sorted.get(key) {
            Some(set) => set
                .iter()
                .filter(|(_, score)| **score <= max_score)
                .map(|(member, score)| (*score, member.clone()))
                .collect(),
            None => Vec::new(),
        };
        matches.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        matches.truncate(limit);
        Ok(matches.into_iter().map(|(_, member)| member).collect())
    }

    async fn sorted_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let removed = match self.sorted.get_mut(key) {
            Some(mut set) => set.remove(member).is_some(),
            None => false,
        };
        Ok(removed)
    }

    async fn sorted_len(&self, key: &str) -> Result<u64, StoreError> {
        Ok(self.sorted.get(key).map_or(0, |set| set.len() as u64))
    }

    async fn put_record(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.records.insert(
            key.to_string(),
            ExpiringValue {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get_record(&self, key: &str) -> Result<Option<String>, StoreError> {
        let live = self
            .records
            .get(key)
            .map(|entry| (entry.value.clone(), entry.expires_at));
        match live {
            Some((value, expires_at)) if expires_at > Instant::now() => Ok(Some(value)),
            Some(_) => {
                self.records.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
