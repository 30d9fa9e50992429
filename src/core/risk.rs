//! Risk aggregation: composite suspicion score, threat level, risk factors
//! and alert rules.
//!
//! Every term works on clamped inputs so the composite always stays in
//! `[0, 100]`. Evaluation is a pure function of the reading and the profile.

use crate::core::alerts::{Alert, AlertSource, AlertType, Severity};
use crate::sampler::types::{clamp_score, SignalReading, SCORE_MAX};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance added before flooring so float error cannot drop an exact
/// integer composite (e.g. 70.0 computed as 69.999...) to the band below.
const FLOOR_EPSILON: f64 = 1e-9;

// ============================================================================
// Profile
// ============================================================================

/// Weights of the composite suspicion score.
///
/// ```text
/// score = (100 - authenticity)         * authenticity
///       + (100 - attention)            * attention
///       +  stress                      * stress
///       + (identity verified ? 0 : identity_penalty)
///       + (100 - connection_stability) * connection
///       +  surveillance_threat_score   * surveillance
/// ```
///
/// The default weights sum to 0.80 of a 0-100 scale plus a flat 20 point
/// identity penalty, so a fully hostile reading saturates at 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub authenticity: f64,
    pub attention: f64,
    pub stress: f64,
    /// Flat penalty (not scaled) when identity is not verified
    pub identity_penalty: f64,
    pub connection: f64,
    pub surveillance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            authenticity: 0.30,
            attention: 0.20,
            stress: 0.15,
            identity_penalty: 20.0,
            connection: 0.10,
            surveillance: 0.25,
        }
    }
}

impl ScoreWeights {
    fn validate(&self) -> Result<(), String> {
        let named = [
            ("authenticity", self.authenticity),
            ("attention", self.attention),
            ("stress", self.stress),
            ("identity_penalty", self.identity_penalty),
            ("connection", self.connection),
            ("surveillance", self.surveillance),
        ];
        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("weight '{name}' must be a non-negative number, got {weight}"));
            }
        }
        Ok(())
    }
}

/// Upper cut points of the threat bands. A score below `low` is Low, below
/// `medium` is Medium, below `high` is High, anything else Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatBands {
    pub low: u8,
    pub medium: u8,
    pub high: u8,
}

impl Default for ThreatBands {
    fn default() -> Self {
        Self {
            low: 25,
            medium: 50,
            high: 75,
        }
    }
}

impl ThreatBands {
    /// Map a suspicion score to its threat level.
    pub fn classify(&self, score: u8) -> ThreatLevel {
        if score < self.low {
            ThreatLevel::Low
        } else if score < self.medium {
            ThreatLevel::Medium
        } else if score < self.high {
            ThreatLevel::High
        } else {
            ThreatLevel::Critical
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.low == 0 || !(self.low < self.medium && self.medium < self.high) || self.high > 100
        {
            return Err(format!(
                "threat bands must satisfy 0 < low < medium < high <= 100, got {}/{}/{}",
                self.low, self.medium, self.high
            ));
        }
        Ok(())
    }
}

/// Thresholds for risk factors and alert rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Identity is verified when confidence exceeds this value
    pub identity_confidence: f64,
    /// Stress above this adds a risk factor
    pub stress_factor: f64,
    /// Stress above this raises a behavioral anomaly alert
    pub stress_alert: f64,
    /// Attention below this adds a risk factor
    pub attention_factor: f64,
    /// Stability below this adds a factor and raises a connection alert
    pub connection: f64,
    /// Surveillance score above this adds a risk factor
    pub surveillance_factor: f64,
    /// Surveillance score above this raises a surveillance alert
    pub surveillance_alert: f64,
    /// Suspicion score above this raises a risk prediction alert
    pub risk_prediction: u8,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            identity_confidence: 75.0,
            stress_factor: 70.0,
            stress_alert: 85.0,
            attention_factor: 50.0,
            connection: 60.0,
            surveillance_factor: 60.0,
            surveillance_alert: 70.0,
            risk_prediction: 70,
        }
    }
}

impl RuleThresholds {
    fn validate(&self) -> Result<(), String> {
        let named = [
            ("identity_confidence", self.identity_confidence),
            ("stress_factor", self.stress_factor),
            ("stress_alert", self.stress_alert),
            ("attention_factor", self.attention_factor),
            ("connection", self.connection),
            ("surveillance_factor", self.surveillance_factor),
            ("surveillance_alert", self.surveillance_alert),
            ("risk_prediction", f64::from(self.risk_prediction)),
        ];
        for (name, value) in named {
            if !(0.0..=SCORE_MAX).contains(&value) {
                return Err(format!("threshold '{name}' must be within 0-100, got {value}"));
            }
        }
        Ok(())
    }
}

/// Full parametrization of the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskProfile {
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub bands: ThreatBands,
    #[serde(default)]
    pub thresholds: RuleThresholds,
}

impl RiskProfile {
    /// Check the profile for out-of-range values.
    pub fn validate(&self) -> Result<(), String> {
        self.weights.validate()?;
        self.bands.validate()?;
        self.thresholds.validate()
    }
}

// ============================================================================
// Assessment
// ============================================================================

/// Coarse ordinal classification of the suspicion score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contribution of each term to the composite, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub authenticity: f64,
    pub attention: f64,
    pub stress: f64,
    pub identity: f64,
    pub connection: f64,
    pub surveillance: f64,
    /// Sum of all terms, unclamped
    pub raw_total: f64,
}

/// Engine state derived from one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Composite suspicion score (0-100)
    pub suspicion_score: u8,
    pub threat_level: ThreatLevel,
    /// Human-readable reasons for the current score
    pub risk_factors: Vec<String>,
    /// Certainty of the signal bundle (0-100), independent of the score
    pub confidence_interval: f64,
    pub breakdown: ScoreBreakdown,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            suspicion_score: 0,
            threat_level: ThreatLevel::Low,
            risk_factors: Vec::new(),
            confidence_interval: 0.0,
            breakdown: ScoreBreakdown::default(),
        }
    }
}

/// Result of evaluating one reading.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub assessment: RiskAssessment,
    /// Alerts raised this tick, most severe first
    pub alerts: Vec<Alert>,
    /// Violations raised this tick
    pub violation_delta: u32,
}

// ============================================================================
// Aggregator
// ============================================================================

/// Combines signal readings into assessments and alerts.
#[derive(Debug, Clone, Default)]
pub struct RiskAggregator {
    profile: RiskProfile,
}

impl RiskAggregator {
    pub fn new(profile: RiskProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &RiskProfile {
        &self.profile
    }

    /// Compute the assessment for a reading.
    pub fn assess(&self, reading: &SignalReading) -> RiskAssessment {
        let reading = reading.clamped();
        let breakdown = self.breakdown(&reading);
        let suspicion_score = floor_score(breakdown.raw_total);

        RiskAssessment {
            suspicion_score,
            threat_level: self.profile.bands.classify(suspicion_score),
            risk_factors: self.risk_factors(&reading),
            confidence_interval: confidence_interval(&reading),
            breakdown,
        }
    }

    /// Evaluate a reading stamped with the current time.
    pub fn evaluate(&self, reading: &SignalReading, previous_violation_count: u32) -> Evaluation {
        self.evaluate_at(reading, previous_violation_count, Utc::now())
    }

    /// Evaluate a reading, stamping alerts with `now`.
    ///
    /// `previous_violation_count` only appears in violation messages; it
    /// never changes the assessment.
    pub fn evaluate_at(
        &self,
        reading: &SignalReading,
        previous_violation_count: u32,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let clamped = reading.clamped();
        let assessment = self.assess(&clamped);
        let t = &self.profile.thresholds;

        let mut alerts = Vec::new();
        let mut violation_delta = 0u32;

        if !clamped.identity_verified(t.identity_confidence) {
            violation_delta += 1;
            alerts.push(Alert::new(
                now,
                AlertType::IdentityVerificationFailed,
                Severity::Critical,
                AlertSource::Identity,
                format!(
                    "Identity verification failed (confidence {:.0}%){}",
                    clamped.identity_confidence,
                    prior_suffix(previous_violation_count)
                ),
                if clamped.identity_vetoed(t.identity_confidence) {
                    // The sampler's own verdict is the evidence here
                    SCORE_MAX
                } else {
                    SCORE_MAX - clamped.identity_confidence
                },
            ));
        }

        if assessment.suspicion_score > t.risk_prediction {
            violation_delta += 1;
            alerts.push(Alert::new(
                now,
                AlertType::RiskPrediction,
                Severity::Critical,
                AlertSource::RiskModel,
                format!(
                    "High cheating probability detected ({}%){}",
                    assessment.suspicion_score,
                    prior_suffix(previous_violation_count)
                ),
                f64::from(assessment.suspicion_score),
            ));
        }

        if clamped.connection_stability < t.connection {
            alerts.push(Alert::new(
                now,
                AlertType::ConnectionUnstable,
                Severity::High,
                AlertSource::Network,
                format!(
                    "Connection unstable (stability {:.0}%, latency {:.0} ms)",
                    clamped.connection_stability, clamped.connection_latency_ms
                ),
                SCORE_MAX - clamped.connection_stability,
            ));
        }

        if clamped.stress > t.stress_alert {
            alerts.push(Alert::new(
                now,
                AlertType::BehavioralAnomaly,
                Severity::Medium,
                AlertSource::Behavior,
                format!("Behavioral anomaly: stress at {:.0}%", clamped.stress),
                clamped.stress,
            ));
        }

        if let Some(threat) = clamped.surveillance_threat_score {
            if threat > t.surveillance_alert {
                alerts.push(Alert::new(
                    now,
                    AlertType::SurveillanceAlert,
                    Severity::High,
                    AlertSource::Surveillance,
                    format!("Surveillance model threat score {threat:.0}%"),
                    threat,
                ));
            }
        }

        // Stable sort keeps rule order within one severity
        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));

        Evaluation {
            assessment,
            alerts,
            violation_delta,
        }
    }

    fn breakdown(&self, r: &SignalReading) -> ScoreBreakdown {
        let w = &self.profile.weights;
        let verified = r.identity_verified(self.profile.thresholds.identity_confidence);

        let authenticity = (SCORE_MAX - r.authenticity) * w.authenticity;
        let attention = (SCORE_MAX - r.attention) * w.attention;
        let stress = r.stress * w.stress;
        let identity = if verified { 0.0 } else { w.identity_penalty };
        let connection = (SCORE_MAX - r.connection_stability) * w.connection;
        let surveillance = r.surveillance_threat_score.unwrap_or(0.0) * w.surveillance;

        ScoreBreakdown {
            authenticity,
            attention,
            stress,
            identity,
            connection,
            surveillance,
            raw_total: authenticity + attention + stress + identity + connection + surveillance,
        }
    }

    fn risk_factors(&self, r: &SignalReading) -> Vec<String> {
        let t = &self.profile.thresholds;
        let mut factors = Vec::new();

        if r.stress > t.stress_factor {
            factors.push("High stress levels detected".to_string());
        }
        if r.attention < t.attention_factor {
            factors.push("Low attention span".to_string());
        }
        if !r.identity_verified(t.identity_confidence) {
            factors.push("Identity verification failed".to_string());
        }
        if r.connection_stability < t.connection {
            factors.push("Connection unstable".to_string());
        }
        if let Some(threat) = r.surveillance_threat_score {
            if threat > t.surveillance_factor {
                factors.push("Surveillance model flagged suspicious behavior".to_string());
            }
        }

        factors
    }
}

/// Message suffix naming earlier violations in the session.
fn prior_suffix(previous_violation_count: u32) -> String {
    match previous_violation_count {
        0 => String::new(),
        1 => " after 1 prior violation".to_string(),
        n => format!(" after {n} prior violations"),
    }
}

/// Clamp and floor a raw composite into the 0-100 integer score.
fn floor_score(raw: f64) -> u8 {
    let bounded = clamp_score(raw + FLOOR_EPSILON);
    bounded.floor() as u8
}

/// How much the signal bundle itself can be trusted.
fn confidence_interval(r: &SignalReading) -> f64 {
    let mean = (r.identity_confidence
        + r.voice_consistency
        + r.environment_quality
        + r.connection_stability)
        / 4.0;
    clamp_score(mean)
}
