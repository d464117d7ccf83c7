//! Confidence-scored disposition decisions for completed calls.
//!
//! The engine is a pure function: given a call record, the analysis report,
//! and the configured outcome catalog, it ranks every candidate by a
//! weighted four-factor score and decides whether the winner is applied
//! automatically, suggested for review, or left to a human. Calls without
//! analysis fall back to a small fixed-confidence rule table.

pub mod config;
pub mod engine;
pub mod error;
pub mod modifiers;
pub mod rules;
pub mod scoring;

pub use config::{DecisionThresholds, EngineConfig, ScoringWeights};
pub use engine::{
    Breakdown, Decision, DecisionEngine, Evaluation, RankedAlternative, RecommendedAction,
};
pub use error::EngineError;
pub use scoring::FactorScores;
