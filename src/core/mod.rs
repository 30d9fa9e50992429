//! Core functionality for the Exam Proctor Agent.
//!
//! This module contains:
//! - Risk aggregation from signal readings into a suspicion score
//! - Alert types and the bounded alert log

pub mod alerts;
pub mod risk;

// Re-export commonly used types
pub use alerts::{Alert, AlertLog, AlertSource, AlertType, Severity, DEFAULT_ALERT_CAPACITY};
pub use risk::{
    Evaluation, RiskAggregator, RiskAssessment, RiskProfile, RuleThresholds, ScoreBreakdown,
    ScoreWeights, ThreatBands, ThreatLevel,
};
