use common::analysis::AnalysisReport;
use common::call::CallRecord;
use common::disposition::{DispositionOutcome, OutcomeCategory};
use serde::Serialize;

use crate::config::{EngineConfig, ScoringWeights};
use crate::error::EngineError;
use crate::modifiers::{self, ConfidenceModifier};
use crate::rules;
use crate::scoring::{self, FactorScores};

/// Minimum fraction of defined auto-apply predicates that must hold before
/// a candidate's confidence boost counts.
const AUTO_APPLY_FRACTION: f64 = 0.8;

/// Runner-up candidates reported alongside the chosen one.
const MAX_ALTERNATIVES: usize = 2;

/// What to do with the chosen outcome. Variants are ordered from least to
/// most automated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Not confident enough to act without a human.
    ManualRequired,
    /// Confident enough to propose, not to apply.
    Suggest,
    /// Confident enough to apply without review.
    AutoApply,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::ManualRequired => "manual_required",
            RecommendedAction::Suggest => "suggest",
            RecommendedAction::AutoApply => "auto_apply",
        }
    }
}

impl std::fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A runner-up candidate and the score it lost with.
#[derive(Clone, Debug, Serialize)]
pub struct RankedAlternative {
    pub name: String,
    pub category: OutcomeCategory,
    pub score: f64,
}

/// Audit trail for one decision, persisted alongside the disposition
/// history record.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum Breakdown {
    Weighted {
        factors: FactorScores,
        weights: ScoringWeights,
        weighted_score: f64,
        auto_apply_boost: f64,
        modifiers: Vec<ConfidenceModifier>,
    },
    BasicRule {
        rule: &'static str,
    },
}

#[derive(Clone, Debug)]
pub struct Decision {
    pub outcome: DispositionOutcome,
    pub confidence: f64,
    pub action: RecommendedAction,
    pub alternatives: Vec<RankedAlternative>,
    pub breakdown: Breakdown,
}

/// Result of one evaluation call.
#[derive(Clone, Debug)]
pub enum Evaluation {
    /// The call already carries a terminal disposition and re-evaluation
    /// was not forced. Nothing was computed.
    AlreadyProcessed,
    /// A decision was reached, weighted or rule-based.
    Decided(Decision),
    /// No analysis was available and no rule fired; a human has to pick.
    ManualOnly,
}

struct ScoredCandidate<'a> {
    candidate: &'a DispositionOutcome,
    factors: FactorScores,
    weighted: f64,
    boost: f64,
    score: f64,
}

/// Pure decision function over call signals. Holds only validated
/// configuration; persistence of the chosen outcome belongs to callers.
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    /// Validates the configuration up front. A bad configuration is a
    /// deployment error and should abort startup, not fail per call.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Evaluate one call against the candidate outcome catalog.
    ///
    /// `analysis` being `None` selects the basic rule table. `force`
    /// re-evaluates a call whose disposition is already terminal.
    pub fn evaluate(
        &self,
        call: &CallRecord,
        analysis: Option<&AnalysisReport>,
        candidates: &[DispositionOutcome],
        force: bool,
    ) -> Result<Evaluation, EngineError> {
        if !force
            && call
                .disposition
                .as_ref()
                .is_some_and(|applied| applied.is_terminal())
        {
            return Ok(Evaluation::AlreadyProcessed);
        }

        let Some(analysis) = analysis else {
            return Ok(self.rule_only(call, candidates));
        };

        if candidates.is_empty() {
            return Err(EngineError::NoCandidates);
        }

        let mut scored: Vec<ScoredCandidate<'_>> = candidates
            .iter()
            .map(|candidate| self.score_candidate(call, analysis, candidate))
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let chosen = scored.remove(0);
        let alternatives = scored
            .iter()
            .take(MAX_ALTERNATIVES)
            .map(|s| RankedAlternative {
                name: s.candidate.name.clone(),
                category: s.candidate.category,
                score: round2(s.score),
            })
            .collect();

        let modifiers = modifiers::confidence_modifiers(call, analysis);
        let confidence =
            (chosen.score + modifiers::total_delta(&modifiers)).clamp(0.0, 100.0);
        let action = self.action_for(confidence);

        Ok(Evaluation::Decided(Decision {
            outcome: chosen.candidate.clone(),
            confidence: round2(confidence),
            action,
            alternatives,
            breakdown: Breakdown::Weighted {
                factors: chosen.factors,
                weights: self.config.weights,
                weighted_score: round2(chosen.weighted),
                auto_apply_boost: chosen.boost,
                modifiers,
            },
        }))
    }

    fn rule_only(&self, call: &CallRecord, candidates: &[DispositionOutcome]) -> Evaluation {
        match rules::basic_rule_decision(call, candidates) {
            Some(rule) => Evaluation::Decided(Decision {
                confidence: rule.confidence,
                action: self.action_for(rule.confidence),
                outcome: rule.outcome,
                alternatives: Vec::new(),
                breakdown: Breakdown::BasicRule { rule: rule.rule },
            }),
            None => Evaluation::ManualOnly,
        }
    }

    fn score_candidate<'a>(
        &self,
        call: &CallRecord,
        analysis: &AnalysisReport,
        candidate: &'a DispositionOutcome,
    ) -> ScoredCandidate<'a> {
        let factors = scoring::factor_scores(call, analysis, candidate);
        let weighted = self.config.weights.apply(&factors);
        let boost = match &candidate.auto_apply {
            Some(conditions)
                if scoring::auto_apply_fraction(call, analysis, conditions)
                    >= AUTO_APPLY_FRACTION =>
            {
                candidate.confidence_boost
            }
            _ => 0.0,
        };
        ScoredCandidate {
            candidate,
            factors,
            weighted,
            boost,
            score: weighted + boost,
        }
    }

    fn action_for(&self, confidence: f64) -> RecommendedAction {
        let thresholds = self.config.thresholds;
        if confidence >= thresholds.auto_apply {
            RecommendedAction::AutoApply
        } else if confidence >= thresholds.suggest {
            RecommendedAction::Suggest
        } else {
            RecommendedAction::ManualRequired
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
