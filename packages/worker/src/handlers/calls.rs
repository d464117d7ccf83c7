use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::collaborators::TelephonyClient;
use common::jobs::SyncCallsJob;
use jobq::Job;
use serde_json::json;
use tracing::info;

use crate::registry::JobHandler;

/// Imports recent call records from the telephony backend.
pub struct SyncCallsHandler {
    telephony: Arc<dyn TelephonyClient>,
}

impl SyncCallsHandler {
    pub fn new(telephony: Arc<dyn TelephonyClient>) -> Self {
        Self { telephony }
    }
}

#[async_trait]
impl JobHandler for SyncCallsHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<serde_json::Value> {
        let payload: SyncCallsJob = serde_json::from_value(job.payload.clone())?;
        let window = Duration::from_secs(u64::from(payload.window_minutes) * 60);
        let imported = self.telephony.sync_calls(window).await?;
        info!(
            window_minutes = payload.window_minutes,
            imported, "Call sync finished"
        );
        Ok(json!({ "imported": imported }))
    }
}
