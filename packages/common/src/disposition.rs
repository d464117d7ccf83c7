use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::EscalationRisk;

/// Business category of a disposition outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Positive,
    Neutral,
    Negative,
}

/// Field-level predicates under which an outcome may be auto-applied with a
/// confidence boost. All bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoApplyConditions {
    pub min_sentiment_score: Option<f64>,
    pub min_quality_score: Option<f64>,
    /// At least one of these keywords must appear in the analysis keywords.
    pub required_keywords: Option<Vec<String>>,
    pub escalation_risk: Option<EscalationRisk>,
    pub min_duration_seconds: Option<u32>,
    pub max_duration_seconds: Option<u32>,
}

impl AutoApplyConditions {
    /// Number of predicates actually defined on this condition set.
    pub fn defined_count(&self) -> usize {
        [
            self.min_sentiment_score.is_some(),
            self.min_quality_score.is_some(),
            self.required_keywords.is_some(),
            self.escalation_risk.is_some(),
            self.min_duration_seconds.is_some(),
            self.max_duration_seconds.is_some(),
        ]
        .into_iter()
        .filter(|defined| *defined)
        .count()
    }
}

/// One candidate outcome from the configured disposition catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispositionOutcome {
    pub name: String,
    pub category: OutcomeCategory,
    /// When present, satisfying at least 80% of the defined predicates adds
    /// `confidence_boost` to the candidate's weighted score.
    pub auto_apply: Option<AutoApplyConditions>,
    #[serde(default)]
    pub confidence_boost: f64,
}

impl DispositionOutcome {
    pub fn new(name: impl Into<String>, category: OutcomeCategory) -> Self {
        Self {
            name: name.into(),
            category,
            auto_apply: None,
            confidence_boost: 0.0,
        }
    }
}

/// Who settled the disposition on a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionSource {
    /// Applied by the decision engine without review.
    Auto,
    /// Proposed by the engine, awaiting review.
    Suggested,
    /// Set by a human.
    Manual,
}

/// The disposition currently attached to a call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppliedDisposition {
    pub outcome: String,
    pub source: DispositionSource,
    pub confidence: Option<f64>,
    pub applied_at: DateTime<Utc>,
}

impl AppliedDisposition {
    /// Auto-applied and manual dispositions are final; a suggestion can
    /// still be re-evaluated or overridden.
    pub fn is_terminal(&self) -> bool {
        matches!(self.source, DispositionSource::Auto | DispositionSource::Manual)
    }
}
