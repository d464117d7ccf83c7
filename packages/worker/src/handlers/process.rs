use std::sync::Arc;

use async_trait::async_trait;
use common::jobs::{AnalyzeCallJob, ProcessCallJob, TranscribeCallJob};
use jobq::Job;
use pipeline::{CallPipeline, StepOutcome};
use serde_json::json;

use crate::registry::JobHandler;

/// Runs the full pipeline for one call: transcription, analysis,
/// disposition. Any failed step fails the job so the queue retries the
/// whole run; completed steps are skipped on the next attempt.
pub struct ProcessCallHandler {
    pipeline: Arc<CallPipeline>,
}

impl ProcessCallHandler {
    pub fn new(pipeline: Arc<CallPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl JobHandler for ProcessCallHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<serde_json::Value> {
        let payload: ProcessCallJob = serde_json::from_value(job.payload.clone())?;
        let report = self.pipeline.run(&payload.call_id).await?;
        if let Some((step, reason)) = report.first_failure() {
            anyhow::bail!("{step} failed: {reason}");
        }
        Ok(json!({
            "call_id": report.call_id,
            "transcription": report.transcription.as_str(),
            "analysis": report.analysis.as_str(),
            "disposition": report.disposition.as_str(),
        }))
    }
}

/// Runs only the transcription step for one call.
pub struct TranscribeCallHandler {
    pipeline: Arc<CallPipeline>,
}

impl TranscribeCallHandler {
    pub fn new(pipeline: Arc<CallPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl JobHandler for TranscribeCallHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<serde_json::Value> {
        let payload: TranscribeCallJob = serde_json::from_value(job.payload.clone())?;
        let outcome = self.pipeline.run_transcription(&payload.call_id).await?;
        if let StepOutcome::Failed(reason) = &outcome {
            anyhow::bail!("transcription failed: {reason}");
        }
        Ok(json!({
            "call_id": payload.call_id,
            "transcription": outcome.as_str(),
        }))
    }
}

/// Runs only the analysis step for one call.
pub struct AnalyzeCallHandler {
    pipeline: Arc<CallPipeline>,
}

impl AnalyzeCallHandler {
    pub fn new(pipeline: Arc<CallPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl JobHandler for AnalyzeCallHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<serde_json::Value> {
        let payload: AnalyzeCallJob = serde_json::from_value(job.payload.clone())?;
        let outcome = self.pipeline.run_analysis(&payload.call_id).await?;
        if let StepOutcome::Failed(reason) = &outcome {
            anyhow::bail!("analysis failed: {reason}");
        }
        Ok(json!({
            "call_id": payload.call_id,
            "analysis": outcome.as_str(),
        }))
    }
}
