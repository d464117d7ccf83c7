use std::sync::Arc;

use common::analysis::{AnalysisModule, AnalysisReport};
use common::call::{CallRecord, PipelineStep, StepStatus};
use common::collaborators::{Analyzer, CallRepository, Transcriber};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::service::{DispositionResult, DispositionService};

/// How one pipeline step ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran and succeeded.
    Completed,
    /// A completed result was already on record; nothing was re-run.
    AlreadyDone,
    /// The step does not apply to this call shape.
    Skipped,
    /// The step failed with the contained collaborator error.
    Failed(String),
    /// An earlier step failed first.
    NotReached,
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Completed => "completed",
            StepOutcome::AlreadyDone => "already_done",
            StepOutcome::Skipped => "skipped",
            StepOutcome::Failed(_) => "failed",
            StepOutcome::NotReached => "not_reached",
        }
    }
}

/// Step-by-step account of one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    pub call_id: String,
    pub transcription: StepOutcome,
    pub analysis: StepOutcome,
    pub disposition: StepOutcome,
    /// Present when the disposition step ran.
    pub decision: Option<DispositionResult>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        !self.transcription.is_failure()
            && !self.analysis.is_failure()
            && !self.disposition.is_failure()
    }

    /// The first failed step and its reason, when any step failed.
    pub fn first_failure(&self) -> Option<(&'static str, &str)> {
        for (step, outcome) in [
            ("transcription", &self.transcription),
            ("analysis", &self.analysis),
            ("disposition", &self.disposition),
        ] {
            if let StepOutcome::Failed(reason) = outcome {
                return Some((step, reason));
            }
        }
        None
    }
}

/// Runs the ordered steps for one call: transcription, analysis,
/// disposition. Steps short-circuit on failure; collaborator errors become
/// step statuses rather than propagated errors.
pub struct CallPipeline {
    repo: Arc<dyn CallRepository>,
    transcriber: Arc<dyn Transcriber>,
    analyzer: Arc<dyn Analyzer>,
    disposition: Arc<DispositionService>,
}

impl CallPipeline {
    pub fn new(
        repo: Arc<dyn CallRepository>,
        transcriber: Arc<dyn Transcriber>,
        analyzer: Arc<dyn Analyzer>,
        disposition: Arc<DispositionService>,
    ) -> Self {
        Self {
            repo,
            transcriber,
            analyzer,
            disposition,
        }
    }

    pub fn disposition_service(&self) -> Arc<DispositionService> {
        Arc::clone(&self.disposition)
    }

    /// Process one call end to end. Returns `Err` only for persistence or
    /// configuration problems; per-step collaborator failures are reported
    /// in the [`PipelineReport`].
    pub async fn run(&self, call_id: &str) -> Result<PipelineReport, PipelineError> {
        let call = self.repo.call(call_id).await?;

        if !call.has_recording() {
            return self.run_without_recording(&call).await;
        }

        let transcription = match self.transcription_step(&call).await? {
            outcome @ (StepOutcome::Completed | StepOutcome::AlreadyDone) => outcome,
            outcome => {
                return Ok(PipelineReport {
                    call_id: call.id,
                    transcription: outcome,
                    analysis: StepOutcome::NotReached,
                    disposition: StepOutcome::NotReached,
                    decision: None,
                });
            }
        };

        let (analysis_outcome, report) = match self.analysis_step(&call).await? {
            (outcome @ (StepOutcome::Completed | StepOutcome::AlreadyDone), Some(report)) => {
                (outcome, report)
            }
            (outcome, _) => {
                return Ok(PipelineReport {
                    call_id: call.id,
                    transcription,
                    analysis: outcome,
                    disposition: StepOutcome::NotReached,
                    decision: None,
                });
            }
        };

        let decision = self
            .disposition
            .evaluate_loaded(&call, Some(&report), false)
            .await?;

        Ok(PipelineReport {
            call_id: call.id,
            transcription,
            analysis: analysis_outcome,
            disposition: StepOutcome::Completed,
            decision: Some(decision),
        })
    }

    /// Run only the transcription step for one call. Calls without a
    /// recording are marked skipped.
    pub async fn run_transcription(&self, call_id: &str) -> Result<StepOutcome, PipelineError> {
        let call = self.repo.call(call_id).await?;
        if !call.has_recording() {
            self.repo
                .set_step_status(&call.id, PipelineStep::Transcription, StepStatus::Skipped)
                .await?;
            return Ok(StepOutcome::Skipped);
        }
        self.transcription_step(&call).await
    }

    /// Run only the analysis step for one call. Calls without a recording
    /// are marked skipped.
    pub async fn run_analysis(&self, call_id: &str) -> Result<StepOutcome, PipelineError> {
        let call = self.repo.call(call_id).await?;
        if !call.has_recording() {
            self.repo
                .set_step_status(&call.id, PipelineStep::Analysis, StepStatus::Skipped)
                .await?;
            return Ok(StepOutcome::Skipped);
        }
        let (outcome, _) = self.analysis_step(&call).await?;
        Ok(outcome)
    }

    /// Reduced path for calls with no recording: transcription and
    /// analysis cannot run, so only the rule-based disposition applies.
    async fn run_without_recording(
        &self,
        call: &CallRecord,
    ) -> Result<PipelineReport, PipelineError> {
        info!(call_id = %call.id, "Call has no recording, running rule-based disposition only");
        self.repo
            .set_step_status(&call.id, PipelineStep::Transcription, StepStatus::Skipped)
            .await?;
        self.repo
            .set_step_status(&call.id, PipelineStep::Analysis, StepStatus::Skipped)
            .await?;

        let decision = self.disposition.evaluate_loaded(call, None, false).await?;

        Ok(PipelineReport {
            call_id: call.id.clone(),
            transcription: StepOutcome::Skipped,
            analysis: StepOutcome::Skipped,
            disposition: StepOutcome::Completed,
            decision: Some(decision),
        })
    }

    async fn transcription_step(&self, call: &CallRecord) -> Result<StepOutcome, PipelineError> {
        if call.processing.transcription == StepStatus::Completed {
            return Ok(StepOutcome::AlreadyDone);
        }

        self.repo
            .set_step_status(&call.id, PipelineStep::Transcription, StepStatus::Processing)
            .await?;

        let audio_ref = call.recording_url.as_deref().unwrap_or_default();
        match self.transcriber.transcribe(&call.id, audio_ref).await {
            Ok(transcript) => {
                self.repo
                    .set_step_status(&call.id, PipelineStep::Transcription, StepStatus::Completed)
                    .await?;
                info!(
                    call_id = %call.id,
                    words = transcript.word_count,
                    "Transcription completed"
                );
                Ok(StepOutcome::Completed)
            }
            Err(err) => {
                self.repo
                    .set_step_status(&call.id, PipelineStep::Transcription, StepStatus::Failed)
                    .await?;
                warn!(call_id = %call.id, error = %err, "Transcription failed, aborting pipeline");
                Ok(StepOutcome::Failed(err.to_string()))
            }
        }
    }

    async fn analysis_step(
        &self,
        call: &CallRecord,
    ) -> Result<(StepOutcome, Option<AnalysisReport>), PipelineError> {
        if call.processing.analysis == StepStatus::Completed {
            // Reuse the stored report; rerun the backend if it is missing
            // despite the completed status.
            if let Some(stored) = self.repo.analysis(&call.id).await? {
                return Ok((StepOutcome::AlreadyDone, Some(stored)));
            }
            warn!(call_id = %call.id, "Analysis marked completed but no report stored, re-running");
        }

        self.repo
            .set_step_status(&call.id, PipelineStep::Analysis, StepStatus::Processing)
            .await?;

        match self.analyzer.analyze(&call.id, AnalysisModule::ALL).await {
            Ok(report) => {
                self.repo
                    .set_step_status(&call.id, PipelineStep::Analysis, StepStatus::Completed)
                    .await?;
                info!(
                    call_id = %call.id,
                    sentiment = %report.overall_sentiment,
                    quality = report.overall_quality_score,
                    "Analysis completed"
                );
                Ok((StepOutcome::Completed, Some(report)))
            }
            Err(err) => {
                self.repo
                    .set_step_status(&call.id, PipelineStep::Analysis, StepStatus::Failed)
                    .await?;
                warn!(call_id = %call.id, error = %err, "Analysis failed, aborting pipeline");
                Ok((StepOutcome::Failed(err.to_string()), None))
            }
        }
    }
}
