use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall sentiment category produced by the analysis backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        })
    }
}

/// How likely the analysis backend thinks the call needs escalation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationRisk {
    Low,
    Medium,
    High,
    Critical,
}

impl EscalationRisk {
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

/// Analysis modules that can be requested from the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisModule {
    Sentiment,
    Quality,
    Escalation,
    Keywords,
    Topics,
}

impl AnalysisModule {
    /// The full module set requested by the standard pipeline run.
    pub const ALL: &'static [AnalysisModule] = &[
        Self::Sentiment,
        Self::Quality,
        Self::Escalation,
        Self::Keywords,
        Self::Topics,
    ];
}

/// Output of the language-model analysis backend for one call.
///
/// Scores are on a 0..=100 scale. The transcript fields are carried along so
/// the decision engine never has to re-fetch the transcript.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub overall_sentiment: Sentiment,
    pub sentiment_score: f64,
    pub overall_quality_score: f64,
    pub escalation_risk: EscalationRisk,
    /// The backend's own guess at the disposition, informational only.
    pub predicted_disposition: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub policy_violations: Vec<String>,
    #[serde(default)]
    pub transcript_word_count: u32,
    #[serde(default)]
    pub transcript_confidence: f64,
}

impl AnalysisReport {
    /// Case-insensitive check for any of the given fragments among the
    /// extracted keywords.
    pub fn keywords_contain(&self, fragments: &[&str]) -> bool {
        self.keywords.iter().any(|kw| {
            let kw = kw.to_lowercase();
            fragments.iter().any(|frag| kw.contains(frag))
        })
    }
}
