use std::collections::HashSet;

use common::analysis::AnalysisReport;
use common::call::CallRecord;
use serde::Serialize;

/// One additive confidence adjustment and the signal that triggered it.
#[derive(Clone, Debug, Serialize)]
pub struct ConfidenceModifier {
    pub reason: &'static str,
    pub delta: f64,
}

const TECHNICAL_KEYWORDS: &[&str] = &[
    "technical",
    "error",
    "bug",
    "broken",
    "not working",
    "crash",
    "malfunction",
];

const ESCALATION_KEYWORDS: &[&str] = &["escalate", "supervisor", "manager", "complaint"];

/// Adjustments applied to the chosen candidate's confidence. Each triggers
/// independently; callers sum the deltas and clamp the result.
pub fn confidence_modifiers(call: &CallRecord, analysis: &AnalysisReport) -> Vec<ConfidenceModifier> {
    let mut modifiers = Vec::new();

    if analysis.transcript_word_count > 50 && analysis.transcript_confidence > 0.8 {
        modifiers.push(ConfidenceModifier {
            reason: "reliable_transcript",
            delta: 5.0,
        });
    }

    if call.duration_seconds < 30 {
        modifiers.push(ConfidenceModifier {
            reason: "short_call",
            delta: -10.0,
        });
    }

    let distinct_topics: HashSet<String> =
        analysis.topics.iter().map(|t| t.to_lowercase()).collect();
    if distinct_topics.len() > 3 {
        modifiers.push(ConfidenceModifier {
            reason: "many_topics",
            delta: -5.0,
        });
    }

    if analysis.keywords_contain(TECHNICAL_KEYWORDS) {
        modifiers.push(ConfidenceModifier {
            reason: "technical_issue",
            delta: -8.0,
        });
    }

    if !analysis.policy_violations.is_empty() {
        modifiers.push(ConfidenceModifier {
            reason: "policy_violations",
            delta: -15.0,
        });
    }

    if analysis.escalation_risk.is_elevated() || analysis.keywords_contain(ESCALATION_KEYWORDS) {
        modifiers.push(ConfidenceModifier {
            reason: "escalation_signals",
            delta: -20.0,
        });
    }

    modifiers
}

pub fn total_delta(modifiers: &[ConfidenceModifier]) -> f64 {
    modifiers.iter().map(|m| m.delta).sum()
}
