//! Session summary handed to the host when a session stops.

use crate::core::alerts::Alert;
use crate::core::risk::RiskAssessment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Final results of a proctoring session. Created exactly once, on stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Host the session ran on
    pub station_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Ticks elapsed multiplied by the tick interval
    pub total_elapsed_seconds: u64,
    pub tick_count: u64,
    pub violation_count: u32,
    pub final_suspicion_score: u8,
    /// Alerts emitted over the whole session, including evicted ones
    pub alert_count: u64,
    pub peak_suspicion_score: u8,
    pub mean_suspicion_score: f64,
    pub suspicion_std_dev: f64,
    /// Suspicion score of every evaluated tick, oldest first
    pub suspicion_history: Vec<u8>,
    /// Alerts still retained in the session log, newest first
    pub recent_alerts: Vec<Alert>,
    pub last_assessment: Option<RiskAssessment>,
}

/// Descriptive statistics over the suspicion history.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SuspicionStats {
    pub peak: u8,
    pub mean: f64,
    pub std_dev: f64,
}

impl SuspicionStats {
    /// Compute peak, mean and sample standard deviation.
    ///
    /// Empty histories yield zeros; a single tick has zero deviation.
    pub fn from_history(history: &[u8]) -> Self {
        if history.is_empty() {
            return Self::default();
        }

        let values: Vec<f64> = history.iter().map(|&s| f64::from(s)).collect();
        let peak = history.iter().copied().fold(0u8, std::cmp::max);
        let mean = values.iter().mean();
        let std_dev = if values.len() < 2 {
            0.0
        } else {
            values.iter().std_dev()
        };

        Self {
            peak,
            mean,
            std_dev,
        }
    }
}

impl SessionSummary {
    /// Human-readable summary for terminal output.
    pub fn display(&self) -> String {
        let level = self
            .last_assessment
            .as_ref()
            .map(|a| a.threat_level.to_string())
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            "Session Summary ({}):\n\
             - Station: {}\n\
             - Elapsed: {} seconds ({} ticks)\n\
             - Violations: {}\n\
             - Alerts emitted: {}\n\
             - Final suspicion score: {} ({})\n\
             - Peak / mean suspicion: {} / {:.1} (sd {:.1})",
            self.session_id,
            self.station_id,
            self.total_elapsed_seconds,
            self.tick_count,
            self.violation_count,
            self.alert_count,
            self.final_suspicion_score,
            level,
            self.peak_suspicion_score,
            self.mean_suspicion_score,
            self.suspicion_std_dev,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty_history() {
        assert_eq!(SuspicionStats::from_history(&[]), SuspicionStats::default());
    }

    #[test]
    fn test_stats_single_tick() {
        let stats = SuspicionStats::from_history(&[42]);
        assert_eq!(stats.peak, 42);
        assert!((stats.mean - 42.0).abs() < 1e-9);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_stats_history() {
        let stats = SuspicionStats::from_history(&[10, 20, 30, 40]);
        assert_eq!(stats.peak, 40);
        assert!((stats.mean - 25.0).abs() < 1e-9);
        // Sample standard deviation of 10,20,30,40
        assert!((stats.std_dev - 12.909944).abs() < 1e-4);
    }
}
