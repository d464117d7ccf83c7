use std::time::Duration;

/// Default retry schedule in seconds: one minute, five minutes, fifteen
/// minutes.
pub const DEFAULT_BACKOFF_SECS: [u64; 3] = [60, 300, 900];

/// Fixed backoff schedule for failed jobs.
///
/// The Nth retry waits for the Nth entry; once the schedule runs out the
/// last entry repeats.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Build a policy from a schedule in seconds. An empty slice falls back
    /// to the default schedule.
    pub fn new(schedule_secs: &[u64]) -> Self {
        let schedule = if schedule_secs.is_empty() {
            &DEFAULT_BACKOFF_SECS[..]
        } else {
            schedule_secs
        };
        Self {
            delays: schedule.iter().map(|s| Duration::from_secs(*s)).collect(),
        }
    }

    /// Delay before the given retry attempt, 1-based.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let idx = (attempt.saturating_sub(1) as usize).min(self.delays.len() - 1);
        self.delays[idx]
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&DEFAULT_BACKOFF_SECS)
    }
}
