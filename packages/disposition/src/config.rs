use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::scoring::FactorScores;

/// Relative weight of each scoring factor, in percent. The four weights
/// must sum to exactly 100.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub sentiment: f64,
    pub quality: f64,
    pub escalation: f64,
    pub characteristics: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sentiment: 40.0,
            quality: 25.0,
            escalation: 20.0,
            characteristics: 15.0,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.sentiment + self.quality + self.escalation + self.characteristics
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for weight in [
            self.sentiment,
            self.quality,
            self.escalation,
            self.characteristics,
        ] {
            if weight < 0.0 {
                return Err(EngineError::NegativeWeight(weight));
            }
        }
        let sum = self.sum();
        if (sum - 100.0).abs() > 1e-6 {
            return Err(EngineError::InvalidWeights(sum));
        }
        Ok(())
    }

    /// Collapse factor sub-scores into one 0..=100 weighted score.
    pub fn apply(&self, factors: &FactorScores) -> f64 {
        (self.sentiment * factors.sentiment
            + self.quality * factors.quality
            + self.escalation * factors.escalation
            + self.characteristics * factors.characteristics)
            / 100.0
    }
}

/// Confidence cut-offs for the action decision. `auto_apply` must sit
/// strictly above `suggest`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    pub auto_apply: f64,
    pub suggest: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            auto_apply: 80.0,
            suggest: 60.0,
        }
    }
}

impl DecisionThresholds {
    pub fn validate(&self) -> Result<(), EngineError> {
        for threshold in [self.auto_apply, self.suggest] {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(EngineError::ThresholdOutOfRange(threshold));
            }
        }
        if self.auto_apply <= self.suggest {
            return Err(EngineError::ThresholdsNotMonotonic {
                auto_apply: self.auto_apply,
                suggest: self.suggest,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: ScoringWeights,
    pub thresholds: DecisionThresholds,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.weights.validate()?;
        self.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one_hundred() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.sum(), 100.0);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn skewed_weights_rejected() {
        let weights = ScoringWeights {
            sentiment: 50.0,
            ..Default::default()
        };
        assert_eq!(weights.validate(), Err(EngineError::InvalidWeights(110.0)));
    }

    #[test]
    fn negative_weight_rejected() {
        let weights = ScoringWeights {
            sentiment: 140.0,
            quality: -40.0,
            escalation: 0.0,
            characteristics: 0.0,
        };
        assert_eq!(weights.validate(), Err(EngineError::NegativeWeight(-40.0)));
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let thresholds = DecisionThresholds {
            auto_apply: 60.0,
            suggest: 60.0,
        };
        assert_eq!(
            thresholds.validate(),
            Err(EngineError::ThresholdsNotMonotonic {
                auto_apply: 60.0,
                suggest: 60.0,
            })
        );
    }

    #[test]
    fn thresholds_must_fit_confidence_scale() {
        let thresholds = DecisionThresholds {
            auto_apply: 120.0,
            suggest: 60.0,
        };
        assert_eq!(
            thresholds.validate(),
            Err(EngineError::ThresholdOutOfRange(120.0))
        );
    }

    #[test]
    fn weighted_apply_matches_hand_computation() {
        let weights = ScoringWeights::default();
        let factors = FactorScores {
            sentiment: 100.0,
            quality: 100.0,
            escalation: 100.0,
            characteristics: 100.0,
        };
        assert_eq!(weights.apply(&factors), 100.0);

        let mixed = FactorScores {
            sentiment: 95.0,
            quality: 95.0,
            escalation: 90.0,
            characteristics: 85.0,
        };
        assert_eq!(weights.apply(&mixed), 92.5);
    }
}
