//! Alerts and the bounded, newest-first alert log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Default number of alerts retained per session.
pub const DEFAULT_ALERT_CAPACITY: usize = 20;

/// Kind of violation or condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    IdentityVerificationFailed,
    RiskPrediction,
    ConnectionUnstable,
    BehavioralAnomaly,
    SurveillanceAlert,
    SamplerLost,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::IdentityVerificationFailed => "identity_verification_failed",
            AlertType::RiskPrediction => "risk_prediction",
            AlertType::ConnectionUnstable => "connection_unstable",
            AlertType::BehavioralAnomaly => "behavioral_anomaly",
            AlertType::SurveillanceAlert => "surveillance_alert",
            AlertType::SamplerLost => "sampler_lost",
        }
    }

    /// Whether this alert kind counts as a violation.
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            AlertType::IdentityVerificationFailed | AlertType::RiskPrediction
        )
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subsystem that raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    Identity,
    RiskModel,
    Network,
    Behavior,
    Surveillance,
    Sampler,
}

/// An emitted alert. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// `ALERT-<unix millis>-<random hex>`
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub source: AlertSource,
    /// Confidence in the alert (0-100)
    pub confidence: f64,
}

impl Alert {
    /// Create an alert stamped at `timestamp` with a fresh id.
    pub fn new(
        timestamp: DateTime<Utc>,
        alert_type: AlertType,
        severity: Severity,
        source: AlertSource,
        message: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("ALERT-{}-{}", timestamp.timestamp_millis(), &random[..8]),
            timestamp,
            alert_type,
            severity,
            message: message.into(),
            source,
            confidence: crate::sampler::clamp_score(confidence),
        }
    }

    /// Critical alert raised when the sampler drops out mid-session.
    pub fn sampler_lost(timestamp: DateTime<Utc>, reason: &str) -> Self {
        Self::new(
            timestamp,
            AlertType::SamplerLost,
            Severity::Critical,
            AlertSource::Sampler,
            format!("Signal sampler unavailable: {reason}"),
            100.0,
        )
    }
}

/// Bounded alert history, newest first.
///
/// Appending beyond capacity evicts the oldest alert.
#[derive(Debug, Clone)]
pub struct AlertLog {
    capacity: usize,
    alerts: VecDeque<Alert>,
    total_appended: u64,
}

impl AlertLog {
    /// Create a log holding at most `capacity` alerts (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            alerts: VecDeque::with_capacity(capacity),
            total_appended: 0,
        }
    }

    /// Add an alert as the newest entry.
    pub fn append(&mut self, alert: Alert) {
        if self.alerts.len() == self.capacity {
            self.alerts.pop_back();
        }
        self.alerts.push_front(alert);
        self.total_appended += 1;
    }

    /// Up to `k` newest alerts, newest first.
    pub fn recent(&self, k: usize) -> Vec<Alert> {
        self.alerts.iter().take(k).cloned().collect()
    }

    /// Number of alerts currently retained.
    pub fn count(&self) -> usize {
        self.alerts.len()
    }

    /// Number of alerts ever appended, including evicted ones.
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Iterate retained alerts, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Copy of every retained alert, newest first.
    pub fn snapshot(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(n: usize) -> Alert {
        Alert::new(
            Utc::now(),
            AlertType::ConnectionUnstable,
            Severity::High,
            AlertSource::Network,
            format!("alert {n}"),
            50.0,
        )
    }

    #[test]
    fn test_alert_id_format() {
        let a = alert(0);
        assert!(a.id.starts_with("ALERT-"));
        assert_eq!(a.id.split('-').count(), 3);
        assert_ne!(a.id, alert(0).id);
    }

    #[test]
    fn test_log_newest_first() {
        let mut log = AlertLog::new(5);
        for n in 0..3 {
            log.append(alert(n));
        }
        let recent = log.recent(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "alert 2");
        assert_eq!(recent[2].message, "alert 0");
    }

    #[test]
    fn test_log_evicts_oldest_beyond_capacity() {
        let capacity = 4;
        let mut log = AlertLog::new(capacity);
        for n in 0..=capacity {
            log.append(alert(n));
        }

        assert_eq!(log.count(), capacity);
        assert_eq!(log.total_appended(), (capacity + 1) as u64);

        let messages: Vec<String> = log.recent(capacity).into_iter().map(|a| a.message).collect();
        assert_eq!(messages, vec!["alert 4", "alert 3", "alert 2", "alert 1"]);
    }

    #[test]
    fn test_recent_respects_k() {
        let mut log = AlertLog::default();
        for n in 0..10 {
            log.append(alert(n));
        }
        assert_eq!(log.recent(3).len(), 3);
        assert_eq!(log.recent(0).len(), 0);
        assert_eq!(log.capacity(), DEFAULT_ALERT_CAPACITY);
    }

    #[test]
    fn test_alert_type_serializes_snake_case() {
        let json = serde_json::to_string(&AlertType::IdentityVerificationFailed).unwrap();
        assert_eq!(json, "\"identity_verification_failed\"");
        assert!(Severity::Critical > Severity::High);
    }
}
