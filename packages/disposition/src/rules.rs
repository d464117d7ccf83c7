use common::call::{CallRecord, CallStatus};
use common::disposition::{DispositionOutcome, OutcomeCategory};

/// Fixed-confidence decision from the rule table, used when no analysis
/// exists for a call.
#[derive(Clone, Debug)]
pub struct RuleDecision {
    pub outcome: DispositionOutcome,
    pub confidence: f64,
    pub rule: &'static str,
}

const NO_ANSWER: &str = "No Answer";
const INFORMATION_PROVIDED: &str = "Information Provided";

/// Rule table keyed on call status and duration. Returns `None` when no
/// rule fires, which callers map to manual review.
pub fn basic_rule_decision(
    call: &CallRecord,
    candidates: &[DispositionOutcome],
) -> Option<RuleDecision> {
    if call.duration_seconds < 10 || call.status == CallStatus::NoAnswer {
        return Some(RuleDecision {
            outcome: catalog_or_default(candidates, NO_ANSWER),
            confidence: 95.0,
            rule: "short_or_no_answer",
        });
    }

    if call.status == CallStatus::Completed && call.duration_seconds > 60 {
        return Some(RuleDecision {
            outcome: catalog_or_default(candidates, INFORMATION_PROVIDED),
            confidence: 70.0,
            rule: "completed_over_a_minute",
        });
    }

    None
}

/// Prefer the configured catalog entry so boosts and categories carry
/// through; otherwise fall back to a plain neutral outcome.
fn catalog_or_default(candidates: &[DispositionOutcome], name: &str) -> DispositionOutcome {
    candidates
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .cloned()
        .unwrap_or_else(|| DispositionOutcome::new(name, OutcomeCategory::Neutral))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::call::{CallDirection, CallProcessingState};

    use super::*;

    fn call(status: CallStatus, duration: u32) -> CallRecord {
        CallRecord {
            id: "call-1".into(),
            session_id: None,
            direction: CallDirection::Outbound,
            status,
            duration_seconds: duration,
            recording_url: None,
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            processing: CallProcessingState::default(),
            disposition: None,
        }
    }

    #[test]
    fn very_short_call_is_no_answer() {
        let decision = basic_rule_decision(&call(CallStatus::Completed, 8), &[]).unwrap();
        assert_eq!(decision.outcome.name, "No Answer");
        assert_eq!(decision.confidence, 95.0);
    }

    #[test]
    fn no_answer_status_is_no_answer_regardless_of_duration() {
        let decision = basic_rule_decision(&call(CallStatus::NoAnswer, 45), &[]).unwrap();
        assert_eq!(decision.outcome.name, "No Answer");
        assert_eq!(decision.confidence, 95.0);
    }

    #[test]
    fn completed_long_call_is_information_provided() {
        let decision = basic_rule_decision(&call(CallStatus::Completed, 120), &[]).unwrap();
        assert_eq!(decision.outcome.name, "Information Provided");
        assert_eq!(decision.confidence, 70.0);
    }

    #[test]
    fn midlength_completed_call_has_no_rule() {
        assert!(basic_rule_decision(&call(CallStatus::Completed, 30), &[]).is_none());
    }

    #[test]
    fn busy_call_has_no_rule() {
        assert!(basic_rule_decision(&call(CallStatus::Busy, 20), &[]).is_none());
    }

    #[test]
    fn catalog_entry_wins_over_synthesized_outcome() {
        let catalog = vec![DispositionOutcome {
            name: "no answer".into(),
            category: OutcomeCategory::Negative,
            auto_apply: None,
            confidence_boost: 5.0,
        }];
        let decision = basic_rule_decision(&call(CallStatus::NoAnswer, 5), &catalog).unwrap();
        assert_eq!(decision.outcome.category, OutcomeCategory::Negative);
        assert_eq!(decision.outcome.confidence_boost, 5.0);
    }
}
