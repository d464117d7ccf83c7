use common::analysis::{AnalysisReport, EscalationRisk, Sentiment};
use common::call::{CallDirection, CallRecord};
use common::disposition::{AutoApplyConditions, DispositionOutcome, OutcomeCategory};
use serde::Serialize;

/// The four factor sub-scores for one candidate, each on 0..=100.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FactorScores {
    pub sentiment: f64,
    pub quality: f64,
    pub escalation: f64,
    pub characteristics: f64,
}

pub(crate) fn factor_scores(
    call: &CallRecord,
    analysis: &AnalysisReport,
    candidate: &DispositionOutcome,
) -> FactorScores {
    FactorScores {
        sentiment: sentiment_alignment(
            candidate.category,
            analysis.overall_sentiment,
            analysis.sentiment_score,
        ),
        quality: quality_alignment(candidate.category, analysis.overall_quality_score),
        escalation: escalation_alignment(&candidate.name, analysis.escalation_risk),
        characteristics: characteristics_alignment(call, &candidate.name),
    }
}

/// Compatibility of the candidate's category with the analysed sentiment.
/// Exact matches score high, opposites low, and the cells involving one
/// neutral side interpolate on the numeric sentiment score.
fn sentiment_alignment(category: OutcomeCategory, sentiment: Sentiment, score: f64) -> f64 {
    let score = score.clamp(0.0, 100.0);
    match (category, sentiment) {
        (OutcomeCategory::Positive, Sentiment::Positive) => 95.0,
        (OutcomeCategory::Negative, Sentiment::Negative) => 95.0,
        (OutcomeCategory::Neutral, Sentiment::Neutral) => 90.0,
        (OutcomeCategory::Positive, Sentiment::Negative) => 20.0,
        (OutcomeCategory::Negative, Sentiment::Positive) => 25.0,
        // A more positive numeric score pulls a positive candidate up and a
        // negative candidate down within the 40..70 band.
        (OutcomeCategory::Positive, Sentiment::Neutral) => 40.0 + score * 0.3,
        (OutcomeCategory::Negative, Sentiment::Neutral) => 70.0 - score * 0.3,
        // Neutral candidates fit best when the numeric score sits near the
        // middle of the scale.
        (OutcomeCategory::Neutral, _) => 70.0 - (score - 50.0).abs() * 0.4,
    }
}

fn quality_alignment(category: OutcomeCategory, quality: f64) -> f64 {
    match category {
        OutcomeCategory::Positive => {
            if quality >= 80.0 {
                95.0
            } else if quality >= 60.0 {
                75.0
            } else {
                40.0
            }
        }
        OutcomeCategory::Negative => {
            if quality <= 40.0 {
                90.0
            } else if quality <= 60.0 {
                75.0
            } else {
                60.0
            }
        }
        OutcomeCategory::Neutral => 80.0,
    }
}

/// Fit between the escalation risk and what the outcome name implies.
fn escalation_alignment(name: &str, risk: EscalationRisk) -> f64 {
    let name = name.to_lowercase();
    let escalation_like = name_has(&name, &["escalat", "complaint"]);
    let resolved_like = name_has(&name, &["resolv", "satisf"]);
    let follow_up_like = name_has(&name, &["follow", "informat"]);

    match risk {
        EscalationRisk::High | EscalationRisk::Critical => {
            if escalation_like {
                95.0
            } else if resolved_like {
                20.0
            } else {
                50.0
            }
        }
        EscalationRisk::Low => {
            if resolved_like {
                90.0
            } else if escalation_like {
                30.0
            } else {
                60.0
            }
        }
        EscalationRisk::Medium => {
            if follow_up_like {
                85.0
            } else {
                60.0
            }
        }
    }
}

/// Duration, direction, and recording presence nudged around a base of 70.
fn characteristics_alignment(call: &CallRecord, name: &str) -> f64 {
    let name = name.to_lowercase();
    let mut score: f64 = 70.0;

    if call.duration_seconds < 30 {
        if name_has(&name, &["no answer", "not interested"]) {
            score += 20.0;
        }
        if name_has(&name, &["resolv"]) {
            score -= 20.0;
        }
    } else if call.duration_seconds > 300 {
        if name_has(&name, &["resolv", "informat"]) {
            score += 15.0;
        }
        if name_has(&name, &["no answer"]) {
            score -= 25.0;
        }
    }

    match call.direction {
        CallDirection::Outbound => {
            if name_has(&name, &["sale", "not interested"]) {
                score += 10.0;
            }
        }
        CallDirection::Inbound => {
            if name_has(&name, &["complaint", "escalat"]) {
                score += 10.0;
            }
        }
    }

    if !call.has_recording() {
        if name_has(&name, &["no answer"]) {
            score += 15.0;
        } else {
            score -= 10.0;
        }
    }

    score.clamp(0.0, 100.0)
}

/// Fraction of the defined auto-apply predicates the call satisfies.
/// Returns 0 when the condition set defines nothing.
pub(crate) fn auto_apply_fraction(
    call: &CallRecord,
    analysis: &AnalysisReport,
    conditions: &AutoApplyConditions,
) -> f64 {
    let defined = conditions.defined_count();
    if defined == 0 {
        return 0.0;
    }

    let mut satisfied = 0usize;
    if let Some(min) = conditions.min_sentiment_score {
        if analysis.sentiment_score >= min {
            satisfied += 1;
        }
    }
    if let Some(min) = conditions.min_quality_score {
        if analysis.overall_quality_score >= min {
            satisfied += 1;
        }
    }
    if let Some(keywords) = &conditions.required_keywords {
        let fragments: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let fragments: Vec<&str> = fragments.iter().map(String::as_str).collect();
        if analysis.keywords_contain(&fragments) {
            satisfied += 1;
        }
    }
    if let Some(required) = conditions.escalation_risk {
        if analysis.escalation_risk == required {
            satisfied += 1;
        }
    }
    if let Some(min) = conditions.min_duration_seconds {
        if call.duration_seconds >= min {
            satisfied += 1;
        }
    }
    if let Some(max) = conditions.max_duration_seconds {
        if call.duration_seconds <= max {
            satisfied += 1;
        }
    }

    satisfied as f64 / defined as f64
}

fn name_has(name_lower: &str, fragments: &[&str]) -> bool {
    fragments.iter().any(|frag| name_lower.contains(frag))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::call::{CallProcessingState, CallStatus};

    use super::*;

    fn call(duration: u32, direction: CallDirection, recording: bool) -> CallRecord {
        CallRecord {
            id: "call-1".into(),
            session_id: Some("sess-1".into()),
            direction,
            status: CallStatus::Completed,
            duration_seconds: duration,
            recording_url: recording.then(|| "https://recordings/call-1.mp3".into()),
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            processing: CallProcessingState::default(),
            disposition: None,
        }
    }

    fn analysis(sentiment: Sentiment, score: f64, quality: f64, risk: EscalationRisk) -> AnalysisReport {
        AnalysisReport {
            overall_sentiment: sentiment,
            sentiment_score: score,
            overall_quality_score: quality,
            escalation_risk: risk,
            predicted_disposition: None,
            keywords: vec![],
            topics: vec![],
            policy_violations: vec![],
            transcript_word_count: 100,
            transcript_confidence: 0.9,
        }
    }

    #[test]
    fn sentiment_exact_matches_score_high() {
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Positive, Sentiment::Positive, 80.0),
            95.0
        );
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Negative, Sentiment::Negative, 20.0),
            95.0
        );
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Neutral, Sentiment::Neutral, 50.0),
            90.0
        );
    }

    #[test]
    fn sentiment_opposites_score_low() {
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Positive, Sentiment::Negative, 10.0),
            20.0
        );
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Negative, Sentiment::Positive, 90.0),
            25.0
        );
    }

    #[test]
    fn neutral_cells_interpolate_on_numeric_score() {
        // Positive candidate against neutral sentiment climbs with the score.
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Positive, Sentiment::Neutral, 0.0),
            40.0
        );
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Positive, Sentiment::Neutral, 100.0),
            70.0
        );
        // Negative candidate moves the opposite way.
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Negative, Sentiment::Neutral, 100.0),
            40.0
        );
        // Neutral candidate peaks at the middle of the scale.
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Neutral, Sentiment::Positive, 50.0),
            70.0
        );
        assert_eq!(
            sentiment_alignment(OutcomeCategory::Neutral, Sentiment::Positive, 100.0),
            50.0
        );
    }

    #[test]
    fn quality_bands_per_category() {
        assert_eq!(quality_alignment(OutcomeCategory::Positive, 85.0), 95.0);
        assert_eq!(quality_alignment(OutcomeCategory::Positive, 70.0), 75.0);
        assert_eq!(quality_alignment(OutcomeCategory::Positive, 30.0), 40.0);

        assert_eq!(quality_alignment(OutcomeCategory::Negative, 30.0), 90.0);
        assert_eq!(quality_alignment(OutcomeCategory::Negative, 55.0), 75.0);
        assert_eq!(quality_alignment(OutcomeCategory::Negative, 90.0), 60.0);

        assert_eq!(quality_alignment(OutcomeCategory::Neutral, 10.0), 80.0);
        assert_eq!(quality_alignment(OutcomeCategory::Neutral, 95.0), 80.0);
    }

    #[test]
    fn escalation_rewards_matching_names() {
        assert_eq!(
            escalation_alignment("Escalation Required", EscalationRisk::High),
            95.0
        );
        assert_eq!(
            escalation_alignment("Resolved - Customer Satisfied", EscalationRisk::Critical),
            20.0
        );
        assert_eq!(
            escalation_alignment("Resolved - Customer Satisfied", EscalationRisk::Low),
            90.0
        );
        assert_eq!(
            escalation_alignment("Escalation Required", EscalationRisk::Low),
            30.0
        );
        assert_eq!(
            escalation_alignment("Follow Up Required", EscalationRisk::Medium),
            85.0
        );
        assert_eq!(escalation_alignment("Sale Closed", EscalationRisk::Medium), 60.0);
    }

    #[test]
    fn characteristics_short_call_favors_no_answer() {
        let call = call(10, CallDirection::Outbound, true);
        // Base 70 plus 20 for a short call matching "no answer".
        assert_eq!(characteristics_alignment(&call, "No Answer"), 90.0);
        // Base 70 minus 20 for "resolved" on a short call.
        assert_eq!(characteristics_alignment(&call, "Resolved"), 50.0);
    }

    #[test]
    fn characteristics_long_call_favors_resolution() {
        let call = call(400, CallDirection::Inbound, true);
        assert_eq!(characteristics_alignment(&call, "Resolved"), 85.0);
        assert_eq!(characteristics_alignment(&call, "No Answer"), 45.0);
    }

    #[test]
    fn characteristics_direction_bonus() {
        let outbound = call(120, CallDirection::Outbound, true);
        assert_eq!(characteristics_alignment(&outbound, "Not Interested"), 80.0);

        let inbound = call(120, CallDirection::Inbound, true);
        assert_eq!(characteristics_alignment(&inbound, "Complaint Filed"), 80.0);
        assert_eq!(characteristics_alignment(&outbound, "Complaint Filed"), 70.0);
    }

    #[test]
    fn characteristics_missing_recording() {
        let call = call(15, CallDirection::Outbound, false);
        // 70 + 20 (short, no-answer) + 15 (no recording) = 105, clamped.
        assert_eq!(characteristics_alignment(&call, "No Answer"), 100.0);
        // 70 - 20 (short, resolved) - 10 (no recording) = 40.
        assert_eq!(characteristics_alignment(&call, "Resolved"), 40.0);
    }

    #[test]
    fn fraction_counts_each_defined_predicate() {
        let call = call(120, CallDirection::Inbound, true);
        let mut report = analysis(Sentiment::Positive, 85.0, 90.0, EscalationRisk::Low);
        report.keywords = vec!["resolved".into(), "thanks".into()];

        let conditions = AutoApplyConditions {
            min_sentiment_score: Some(70.0),
            min_quality_score: Some(95.0),
            required_keywords: Some(vec!["Resolved".into()]),
            escalation_risk: Some(EscalationRisk::Low),
            min_duration_seconds: Some(60),
            max_duration_seconds: None,
        };
        // Quality predicate misses, the other four hold.
        assert_eq!(auto_apply_fraction(&call, &report, &conditions), 0.8);
    }

    #[test]
    fn fraction_zero_when_nothing_defined() {
        let call = call(120, CallDirection::Inbound, true);
        let report = analysis(Sentiment::Neutral, 50.0, 50.0, EscalationRisk::Low);
        assert_eq!(
            auto_apply_fraction(&call, &report, &AutoApplyConditions::default()),
            0.0
        );
    }

    #[test]
    fn fraction_duration_bounds_are_inclusive() {
        let call = call(120, CallDirection::Inbound, true);
        let report = analysis(Sentiment::Neutral, 50.0, 50.0, EscalationRisk::Low);
        let conditions = AutoApplyConditions {
            min_duration_seconds: Some(120),
            max_duration_seconds: Some(120),
            ..Default::default()
        };
        assert_eq!(auto_apply_fraction(&call, &report, &conditions), 1.0);
    }
}
