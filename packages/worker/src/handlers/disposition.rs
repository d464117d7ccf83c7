use std::sync::Arc;

use async_trait::async_trait;
use common::jobs::EvaluateDispositionJob;
use jobq::Job;
use pipeline::{DispositionResult, DispositionService};
use serde_json::json;

use crate::registry::JobHandler;

/// Evaluates the disposition for a call whose analysis is already stored.
pub struct EvaluateDispositionHandler {
    service: Arc<DispositionService>,
}

impl EvaluateDispositionHandler {
    pub fn new(service: Arc<DispositionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobHandler for EvaluateDispositionHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<serde_json::Value> {
        let payload: EvaluateDispositionJob = serde_json::from_value(job.payload.clone())?;
        let result = self
            .service
            .evaluate_disposition(&payload.call_id, payload.force)
            .await?;

        let summary = match result {
            DispositionResult::AlreadyProcessed => json!({
                "call_id": payload.call_id,
                "disposition": "already_processed",
            }),
            DispositionResult::ManualOnly => json!({
                "call_id": payload.call_id,
                "disposition": "manual_required",
            }),
            DispositionResult::Evaluated {
                outcome,
                confidence,
                action,
                ..
            } => json!({
                "call_id": payload.call_id,
                "disposition": "evaluated",
                "outcome": outcome,
                "confidence": confidence,
                "action": action.as_str(),
            }),
        };
        Ok(summary)
    }
}
