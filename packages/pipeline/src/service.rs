use std::sync::Arc;

use chrono::Utc;
use common::analysis::AnalysisReport;
use common::call::{CallRecord, PipelineStep, StepStatus};
use common::collaborators::{CallRepository, DispositionHistoryRecord};
use common::disposition::{AppliedDisposition, DispositionSource};
use disposition::{Decision, DecisionEngine, EngineConfig, EngineError, Evaluation, RecommendedAction};
use tracing::{debug, info};

use crate::error::PipelineError;

/// Outcome of one disposition evaluation for a call.
#[derive(Clone, Debug)]
pub enum DispositionResult {
    /// A terminal disposition was already present; nothing was recomputed
    /// and no history was written.
    AlreadyProcessed,
    /// The engine reached a decision; `status` is what was recorded on the
    /// call's disposition step.
    Evaluated {
        outcome: String,
        confidence: f64,
        action: RecommendedAction,
        status: StepStatus,
    },
    /// No decision was possible; the call is queued for manual review.
    ManualOnly,
}

/// Applies decision engine output to call records: writes the disposition,
/// the step status, and one history row per decision.
pub struct DispositionService {
    repo: Arc<dyn CallRepository>,
    engine: DecisionEngine,
}

impl DispositionService {
    pub fn new(repo: Arc<dyn CallRepository>, config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            repo,
            engine: DecisionEngine::new(config)?,
        })
    }

    /// Evaluate a call's disposition from its stored state. `force`
    /// re-evaluates even if a terminal disposition is already attached.
    pub async fn evaluate_disposition(
        &self,
        call_id: &str,
        force: bool,
    ) -> Result<DispositionResult, PipelineError> {
        let call = self.repo.call(call_id).await?;
        let analysis = self.repo.analysis(call_id).await?;
        self.evaluate_loaded(&call, analysis.as_ref(), force).await
    }

    /// Same as [`Self::evaluate_disposition`] but for a call the caller has
    /// already loaded, together with the analysis to score against.
    pub async fn evaluate_loaded(
        &self,
        call: &CallRecord,
        analysis: Option<&AnalysisReport>,
        force: bool,
    ) -> Result<DispositionResult, PipelineError> {
        let candidates = self.repo.outcomes().await?;
        match self.engine.evaluate(call, analysis, &candidates, force)? {
            Evaluation::AlreadyProcessed => {
                debug!(call_id = %call.id, "Disposition already terminal, skipping evaluation");
                Ok(DispositionResult::AlreadyProcessed)
            }
            Evaluation::ManualOnly => {
                self.repo
                    .set_step_status(&call.id, PipelineStep::Disposition, StepStatus::ManualRequired)
                    .await?;
                info!(call_id = %call.id, "No disposition decision, left for manual review");
                Ok(DispositionResult::ManualOnly)
            }
            Evaluation::Decided(decision) => self.apply_decision(call, decision).await,
        }
    }

    async fn apply_decision(
        &self,
        call: &CallRecord,
        decision: Decision,
    ) -> Result<DispositionResult, PipelineError> {
        let status = match decision.action {
            RecommendedAction::AutoApply => {
                self.write_disposition(call, &decision, DispositionSource::Auto)
                    .await?;
                StepStatus::AutoApplied
            }
            RecommendedAction::Suggest => {
                self.write_disposition(call, &decision, DispositionSource::Suggested)
                    .await?;
                StepStatus::Suggested
            }
            RecommendedAction::ManualRequired => StepStatus::ManualRequired,
        };
        self.repo
            .set_step_status(&call.id, PipelineStep::Disposition, status)
            .await?;

        let record = DispositionHistoryRecord {
            call_id: call.id.clone(),
            outcome: decision.outcome.name.clone(),
            confidence: decision.confidence,
            action: decision.action.as_str().to_string(),
            breakdown: serde_json::to_value(&decision.breakdown)?,
            evaluated_at: Utc::now(),
        };
        self.repo.append_disposition_history(&record).await?;

        info!(
            call_id = %call.id,
            outcome = %decision.outcome.name,
            confidence = decision.confidence,
            action = %decision.action,
            "Disposition evaluated"
        );
        Ok(DispositionResult::Evaluated {
            outcome: decision.outcome.name,
            confidence: decision.confidence,
            action: decision.action,
            status,
        })
    }

    async fn write_disposition(
        &self,
        call: &CallRecord,
        decision: &Decision,
        source: DispositionSource,
    ) -> Result<(), PipelineError> {
        let applied = AppliedDisposition {
            outcome: decision.outcome.name.clone(),
            source,
            confidence: Some(decision.confidence),
            applied_at: Utc::now(),
        };
        self.repo.apply_disposition(&call.id, &applied).await?;
        Ok(())
    }
}
