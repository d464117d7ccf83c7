use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::analysis::{AnalysisModule, AnalysisReport, EscalationRisk, Sentiment};
use common::call::{CallDirection, CallRecord, CallStatus, PipelineStep, StepStatus};
use common::collaborators::{
    AnalysisError, Analyzer, CallRepository, DispositionHistoryRecord, RepositoryError,
    Transcriber, Transcript, TranscriptionError,
};
use common::disposition::{
    AppliedDisposition, DispositionOutcome, DispositionSource, OutcomeCategory,
};
use disposition::{EngineConfig, RecommendedAction};
use pipeline::{CallPipeline, DispositionResult, DispositionService, StepOutcome, run_batch};

struct FakeRepo {
    calls: Mutex<HashMap<String, CallRecord>>,
    analyses: Mutex<HashMap<String, AnalysisReport>>,
    history: Mutex<Vec<DispositionHistoryRecord>>,
    catalog: Vec<DispositionOutcome>,
}

impl FakeRepo {
    fn new(catalog: Vec<DispositionOutcome>) -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            analyses: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
            catalog,
        }
    }

    fn insert_call(&self, call: CallRecord) {
        self.calls.lock().unwrap().insert(call.id.clone(), call);
    }

    fn insert_analysis(&self, call_id: &str, report: AnalysisReport) {
        self.analyses
            .lock()
            .unwrap()
            .insert(call_id.to_string(), report);
    }

    fn call_snapshot(&self, call_id: &str) -> CallRecord {
        self.calls.lock().unwrap().get(call_id).cloned().unwrap()
    }

    fn history_snapshot(&self) -> Vec<DispositionHistoryRecord> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallRepository for FakeRepo {
    async fn call(&self, call_id: &str) -> Result<CallRecord, RepositoryError> {
        self.calls
            .lock()
            .unwrap()
            .get(call_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("call {call_id}")))
    }

    async fn set_step_status(
        &self,
        call_id: &str,
        step: PipelineStep,
        status: StepStatus,
    ) -> Result<(), RepositoryError> {
        let mut calls = self.calls.lock().unwrap();
        let call = calls
            .get_mut(call_id)
            .ok_or_else(|| RepositoryError::not_found(format!("call {call_id}")))?;
        call.processing.set_step(step, status);
        Ok(())
    }

    async fn update_recording(&self, call_id: &str, url: &str) -> Result<(), RepositoryError> {
        let mut calls = self.calls.lock().unwrap();
        let call = calls
            .get_mut(call_id)
            .ok_or_else(|| RepositoryError::not_found(format!("call {call_id}")))?;
        call.recording_url = Some(url.to_string());
        Ok(())
    }

    async fn analysis(&self, call_id: &str) -> Result<Option<AnalysisReport>, RepositoryError> {
        Ok(self.analyses.lock().unwrap().get(call_id).cloned())
    }

    async fn apply_disposition(
        &self,
        call_id: &str,
        applied: &AppliedDisposition,
    ) -> Result<(), RepositoryError> {
        let mut calls = self.calls.lock().unwrap();
        let call = calls
            .get_mut(call_id)
            .ok_or_else(|| RepositoryError::not_found(format!("call {call_id}")))?;
        call.disposition = Some(applied.clone());
        Ok(())
    }

    async fn append_disposition_history(
        &self,
        record: &DispositionHistoryRecord,
    ) -> Result<(), RepositoryError> {
        self.history.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn outcomes(&self) -> Result<Vec<DispositionOutcome>, RepositoryError> {
        Ok(self.catalog.clone())
    }
}

struct FakeTranscriber {
    calls: AtomicUsize,
    fail_for: HashSet<String>,
}

impl FakeTranscriber {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_for: HashSet::new(),
        }
    }

    fn failing_for(call_ids: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_for: call_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(
        &self,
        call_id: &str,
        _audio_ref: &str,
    ) -> Result<Transcript, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.contains(call_id) {
            return Err(TranscriptionError::AudioUnavailable(call_id.to_string()));
        }
        Ok(Transcript {
            transcript_ref: format!("transcripts/{call_id}"),
            word_count: 180,
            confidence: 0.92,
        })
    }
}

struct FakeAnalyzer {
    calls: AtomicUsize,
    report: AnalysisReport,
    fail: bool,
}

impl FakeAnalyzer {
    fn returning(report: AnalysisReport) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            report,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            report: positive_report(),
            fail: true,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _call_id: &str,
        _modules: &[AnalysisModule],
    ) -> Result<AnalysisReport, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AnalysisError::Backend("model overloaded".into()));
        }
        Ok(self.report.clone())
    }
}

fn catalog() -> Vec<DispositionOutcome> {
    vec![
        DispositionOutcome::new("Resolved", OutcomeCategory::Positive),
        DispositionOutcome::new("Follow Up Required", OutcomeCategory::Neutral),
        DispositionOutcome::new("Escalated", OutcomeCategory::Negative),
        DispositionOutcome::new("No Answer", OutcomeCategory::Neutral),
    ]
}

fn recorded_call(id: &str) -> CallRecord {
    let started = Utc::now() - Duration::minutes(10);
    CallRecord {
        id: id.to_string(),
        session_id: Some(format!("sess-{id}")),
        direction: CallDirection::Outbound,
        status: CallStatus::Completed,
        duration_seconds: 240,
        recording_url: Some(format!("https://recordings.example/{id}.wav")),
        started_at: started,
        ended_at: Some(started + Duration::seconds(240)),
        processing: Default::default(),
        disposition: None,
    }
}

fn unanswered_call(id: &str) -> CallRecord {
    let started = Utc::now() - Duration::minutes(5);
    CallRecord {
        id: id.to_string(),
        session_id: Some(format!("sess-{id}")),
        direction: CallDirection::Outbound,
        status: CallStatus::NoAnswer,
        duration_seconds: 0,
        recording_url: None,
        started_at: started,
        ended_at: Some(started),
        processing: Default::default(),
        disposition: None,
    }
}

fn positive_report() -> AnalysisReport {
    AnalysisReport {
        overall_sentiment: Sentiment::Positive,
        sentiment_score: 85.0,
        overall_quality_score: 88.0,
        escalation_risk: EscalationRisk::Low,
        predicted_disposition: None,
        keywords: vec!["resolved".into(), "thank you".into()],
        topics: vec!["billing".into()],
        policy_violations: vec![],
        transcript_word_count: 180,
        transcript_confidence: 0.92,
    }
}

fn build_pipeline(
    repo: Arc<FakeRepo>,
    transcriber: Arc<FakeTranscriber>,
    analyzer: Arc<FakeAnalyzer>,
) -> CallPipeline {
    let service = DispositionService::new(repo.clone(), EngineConfig::default())
        .expect("default engine config is valid");
    CallPipeline::new(repo, transcriber, analyzer, Arc::new(service))
}

#[tokio::test]
async fn recorded_call_runs_all_steps_and_auto_applies() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    repo.insert_call(recorded_call("call-1"));
    let transcriber = Arc::new(FakeTranscriber::new());
    let analyzer = Arc::new(FakeAnalyzer::returning(positive_report()));
    let pipeline = build_pipeline(repo.clone(), transcriber.clone(), analyzer.clone());

    let report = pipeline.run("call-1").await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.transcription, StepOutcome::Completed);
    assert_eq!(report.analysis, StepOutcome::Completed);
    assert_eq!(report.disposition, StepOutcome::Completed);
    match report.decision {
        Some(DispositionResult::Evaluated {
            outcome,
            confidence,
            action,
            status,
        }) => {
            assert_eq!(outcome, "Resolved");
            assert!(confidence > 80.0);
            assert_eq!(action, RecommendedAction::AutoApply);
            assert_eq!(status, StepStatus::AutoApplied);
        }
        other => panic!("expected an evaluated decision, got {other:?}"),
    }

    assert_eq!(transcriber.call_count(), 1);
    assert_eq!(analyzer.call_count(), 1);

    let stored = repo.call_snapshot("call-1");
    assert_eq!(stored.processing.transcription, StepStatus::Completed);
    assert_eq!(stored.processing.analysis, StepStatus::Completed);
    assert_eq!(stored.processing.disposition, StepStatus::AutoApplied);
    let applied = stored.disposition.expect("disposition applied");
    assert_eq!(applied.outcome, "Resolved");
    assert_eq!(applied.source, DispositionSource::Auto);

    let history = repo.history_snapshot();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].call_id, "call-1");
    assert_eq!(history[0].outcome, "Resolved");
    assert_eq!(history[0].action, "auto_apply");
    assert_eq!(history[0].breakdown["basis"], "weighted");
}

#[tokio::test]
async fn transcription_failure_short_circuits_later_steps() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    repo.insert_call(recorded_call("call-2"));
    let transcriber = Arc::new(FakeTranscriber::failing_for(&["call-2"]));
    let analyzer = Arc::new(FakeAnalyzer::returning(positive_report()));
    let pipeline = build_pipeline(repo.clone(), transcriber.clone(), analyzer.clone());

    let report = pipeline.run("call-2").await.unwrap();

    assert!(!report.succeeded());
    assert!(matches!(report.transcription, StepOutcome::Failed(_)));
    assert_eq!(report.analysis, StepOutcome::NotReached);
    assert_eq!(report.disposition, StepOutcome::NotReached);
    assert!(report.decision.is_none());

    assert_eq!(analyzer.call_count(), 0);

    let stored = repo.call_snapshot("call-2");
    assert_eq!(stored.processing.transcription, StepStatus::Failed);
    assert_eq!(stored.processing.analysis, StepStatus::Pending);
    assert_eq!(stored.processing.disposition, StepStatus::Pending);
    assert!(stored.disposition.is_none());
    assert!(repo.history_snapshot().is_empty());
}

#[tokio::test]
async fn analysis_failure_leaves_disposition_untouched() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    repo.insert_call(recorded_call("call-3"));
    let transcriber = Arc::new(FakeTranscriber::new());
    let analyzer = Arc::new(FakeAnalyzer::failing());
    let pipeline = build_pipeline(repo.clone(), transcriber.clone(), analyzer.clone());

    let report = pipeline.run("call-3").await.unwrap();

    assert_eq!(report.transcription, StepOutcome::Completed);
    assert!(matches!(report.analysis, StepOutcome::Failed(_)));
    assert_eq!(report.disposition, StepOutcome::NotReached);

    let stored = repo.call_snapshot("call-3");
    assert_eq!(stored.processing.analysis, StepStatus::Failed);
    assert_eq!(stored.processing.disposition, StepStatus::Pending);
    assert!(repo.history_snapshot().is_empty());
}

#[tokio::test]
async fn completed_steps_are_not_re_run() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    let mut call = recorded_call("call-4");
    call.processing.transcription = StepStatus::Completed;
    call.processing.analysis = StepStatus::Completed;
    repo.insert_call(call);
    repo.insert_analysis("call-4", positive_report());
    let transcriber = Arc::new(FakeTranscriber::new());
    let analyzer = Arc::new(FakeAnalyzer::returning(positive_report()));
    let pipeline = build_pipeline(repo.clone(), transcriber.clone(), analyzer.clone());

    let report = pipeline.run("call-4").await.unwrap();

    assert_eq!(report.transcription, StepOutcome::AlreadyDone);
    assert_eq!(report.analysis, StepOutcome::AlreadyDone);
    assert_eq!(report.disposition, StepOutcome::Completed);
    assert_eq!(transcriber.call_count(), 0);
    assert_eq!(analyzer.call_count(), 0);
    assert_eq!(repo.history_snapshot().len(), 1);
}

#[tokio::test]
async fn missing_stored_report_triggers_a_re_analysis() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    let mut call = recorded_call("call-5");
    call.processing.transcription = StepStatus::Completed;
    call.processing.analysis = StepStatus::Completed;
    repo.insert_call(call);
    let transcriber = Arc::new(FakeTranscriber::new());
    let analyzer = Arc::new(FakeAnalyzer::returning(positive_report()));
    let pipeline = build_pipeline(repo.clone(), transcriber.clone(), analyzer.clone());

    let report = pipeline.run("call-5").await.unwrap();

    assert_eq!(report.analysis, StepOutcome::Completed);
    assert_eq!(analyzer.call_count(), 1);
    assert!(report.succeeded());
}

#[tokio::test]
async fn unrecorded_call_takes_the_rule_path() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    repo.insert_call(unanswered_call("call-6"));
    let transcriber = Arc::new(FakeTranscriber::new());
    let analyzer = Arc::new(FakeAnalyzer::returning(positive_report()));
    let pipeline = build_pipeline(repo.clone(), transcriber.clone(), analyzer.clone());

    let report = pipeline.run("call-6").await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.transcription, StepOutcome::Skipped);
    assert_eq!(report.analysis, StepOutcome::Skipped);
    assert_eq!(report.disposition, StepOutcome::Completed);
    assert_eq!(transcriber.call_count(), 0);
    assert_eq!(analyzer.call_count(), 0);

    match report.decision {
        Some(DispositionResult::Evaluated {
            outcome,
            confidence,
            action,
            ..
        }) => {
            assert_eq!(outcome, "No Answer");
            assert_eq!(confidence, 95.0);
            assert_eq!(action, RecommendedAction::AutoApply);
        }
        other => panic!("expected a rule decision, got {other:?}"),
    }

    let stored = repo.call_snapshot("call-6");
    assert_eq!(stored.processing.transcription, StepStatus::Skipped);
    assert_eq!(stored.processing.analysis, StepStatus::Skipped);
    assert_eq!(stored.processing.disposition, StepStatus::AutoApplied);
    assert_eq!(repo.history_snapshot()[0].breakdown["basis"], "basic_rule");
}

#[tokio::test]
async fn terminal_disposition_is_not_re_evaluated() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    let mut call = recorded_call("call-7");
    call.processing.transcription = StepStatus::Completed;
    call.processing.analysis = StepStatus::Completed;
    call.processing.disposition = StepStatus::AutoApplied;
    let applied_at = Utc::now() - Duration::hours(1);
    call.disposition = Some(AppliedDisposition {
        outcome: "Resolved".into(),
        source: DispositionSource::Auto,
        confidence: Some(91.0),
        applied_at,
    });
    repo.insert_call(call);
    repo.insert_analysis("call-7", positive_report());
    let transcriber = Arc::new(FakeTranscriber::new());
    let analyzer = Arc::new(FakeAnalyzer::returning(positive_report()));
    let pipeline = build_pipeline(repo.clone(), transcriber.clone(), analyzer.clone());

    let report = pipeline.run("call-7").await.unwrap();
    assert!(matches!(
        report.decision,
        Some(DispositionResult::AlreadyProcessed)
    ));
    assert!(repo.history_snapshot().is_empty());

    let stored = repo.call_snapshot("call-7");
    let applied = stored.disposition.expect("disposition kept");
    assert_eq!(applied.applied_at, applied_at);
    assert_eq!(applied.confidence, Some(91.0));
}

#[tokio::test]
async fn forced_evaluation_overrides_a_terminal_disposition() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    let mut call = recorded_call("call-8");
    call.disposition = Some(AppliedDisposition {
        outcome: "Escalated".into(),
        source: DispositionSource::Manual,
        confidence: None,
        applied_at: Utc::now() - Duration::hours(2),
    });
    repo.insert_call(call);
    repo.insert_analysis("call-8", positive_report());
    let service = DispositionService::new(repo.clone(), EngineConfig::default()).unwrap();

    let result = service.evaluate_disposition("call-8", false).await.unwrap();
    assert!(matches!(result, DispositionResult::AlreadyProcessed));

    let result = service.evaluate_disposition("call-8", true).await.unwrap();
    match result {
        DispositionResult::Evaluated { outcome, .. } => assert_eq!(outcome, "Resolved"),
        other => panic!("expected a fresh decision, got {other:?}"),
    }
    assert_eq!(repo.history_snapshot().len(), 1);
    let stored = repo.call_snapshot("call-8");
    assert_eq!(stored.disposition.unwrap().outcome, "Resolved");
}

#[tokio::test]
async fn batch_counts_failures_without_stopping_other_calls() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    repo.insert_call(unanswered_call("ok-1"));
    repo.insert_call(recorded_call("bad-1"));
    repo.insert_call(recorded_call("ok-2"));
    let transcriber = Arc::new(FakeTranscriber::failing_for(&["bad-1"]));
    let analyzer = Arc::new(FakeAnalyzer::returning(positive_report()));
    let pipeline = Arc::new(build_pipeline(
        repo.clone(),
        transcriber.clone(),
        analyzer.clone(),
    ));

    let summary = run_batch(
        pipeline,
        vec!["ok-1".into(), "bad-1".into(), "ok-2".into()],
        2,
    )
    .await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    assert!(repo.call_snapshot("ok-1").disposition.is_some());
    assert!(repo.call_snapshot("ok-2").disposition.is_some());
    assert!(repo.call_snapshot("bad-1").disposition.is_none());
}

#[tokio::test]
async fn unknown_call_is_a_pipeline_error() {
    let repo = Arc::new(FakeRepo::new(catalog()));
    let transcriber = Arc::new(FakeTranscriber::new());
    let analyzer = Arc::new(FakeAnalyzer::returning(positive_report()));
    let pipeline = build_pipeline(repo, transcriber, analyzer);

    let err = pipeline.run("missing").await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}
