//! Monitoring transparency log.
//!
//! Tracks what the engine did across sessions (ticks evaluated, alerts
//! raised, violations counted) so a candidate or reviewer can audit the
//! monitoring without access to any signal data.

use crate::core::alerts::{Alert, AlertType, Severity};
use crate::core::risk::RiskAssessment;
use crate::session::sink::AlertSink;
use crate::session::summary::SessionSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monitoring counters, safe to update from any tick thread.
#[derive(Debug)]
pub struct MonitoringLog {
    /// Ticks that produced an assessment
    ticks_evaluated: AtomicU64,
    /// Alerts emitted
    alerts_emitted: AtomicU64,
    /// Alerts with critical severity
    critical_alerts: AtomicU64,
    /// Violations counted
    violations: AtomicU64,
    /// Ticks where the sampler failed
    sampler_failures: AtomicU64,
    /// Sessions stopped with a summary
    sessions_completed: AtomicU64,
    /// Highest suspicion score observed
    peak_suspicion: AtomicU64,
    /// When monitoring started
    monitoring_start: DateTime<Utc>,
}

impl MonitoringLog {
    /// Create a new monitoring log.
    pub fn new() -> Self {
        Self {
            ticks_evaluated: AtomicU64::new(0),
            alerts_emitted: AtomicU64::new(0),
            critical_alerts: AtomicU64::new(0),
            violations: AtomicU64::new(0),
            sampler_failures: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            peak_suspicion: AtomicU64::new(0),
            monitoring_start: Utc::now(),
        }
    }

    /// Record an evaluated tick.
    pub fn record_tick(&self, assessment: &RiskAssessment) {
        self.ticks_evaluated.fetch_add(1, Ordering::Relaxed);
        self.peak_suspicion
            .fetch_max(u64::from(assessment.suspicion_score), Ordering::Relaxed);
    }

    /// Record an emitted alert.
    pub fn record_alert(&self, alert: &Alert) {
        self.alerts_emitted.fetch_add(1, Ordering::Relaxed);
        if alert.severity == Severity::Critical {
            self.critical_alerts.fetch_add(1, Ordering::Relaxed);
        }
        if alert.alert_type.is_violation() {
            self.violations.fetch_add(1, Ordering::Relaxed);
        }
        if alert.alert_type == AlertType::SamplerLost {
            self.sampler_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a completed session.
    pub fn record_session_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> MonitoringStats {
        MonitoringStats {
            ticks_evaluated: self.ticks_evaluated.load(Ordering::Relaxed),
            alerts_emitted: self.alerts_emitted.load(Ordering::Relaxed),
            critical_alerts: self.critical_alerts.load(Ordering::Relaxed),
            violations: self.violations.load(Ordering::Relaxed),
            sampler_failures: self.sampler_failures.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            peak_suspicion: self.peak_suspicion.load(Ordering::Relaxed),
            monitoring_start: self.monitoring_start,
            monitoring_duration_secs: (Utc::now() - self.monitoring_start)
                .num_seconds()
                .max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Monitoring Statistics:\n\
             - Ticks evaluated: {}\n\
             - Alerts emitted: {} ({} critical)\n\
             - Violations counted: {}\n\
             - Sampler failures: {}\n\
             - Sessions completed: {}\n\
             - Peak suspicion score: {}\n\
             - Monitoring duration: {} seconds\n\
             \n\
             Transparency Guarantee:\n\
             - Scores come from simulated signals only\n\
             - No images, audio or keystrokes are recorded\n\
             - Alerts are discarded when the session ends",
            stats.ticks_evaluated,
            stats.alerts_emitted,
            stats.critical_alerts,
            stats.violations,
            stats.sampler_failures,
            stats.sessions_completed,
            stats.peak_suspicion,
            stats.monitoring_duration_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.ticks_evaluated.store(0, Ordering::Relaxed);
        self.alerts_emitted.store(0, Ordering::Relaxed);
        self.critical_alerts.store(0, Ordering::Relaxed);
        self.violations.store(0, Ordering::Relaxed);
        self.sampler_failures.store(0, Ordering::Relaxed);
        self.sessions_completed.store(0, Ordering::Relaxed);
        self.peak_suspicion.store(0, Ordering::Relaxed);
    }
}

impl Default for MonitoringLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for MonitoringLog {
    fn on_alert(&self, _session_id: &str, alert: &Alert) {
        self.record_alert(alert);
    }

    fn on_tick(&self, _session_id: &str, assessment: &RiskAssessment) {
        self.record_tick(assessment);
    }

    fn on_session_complete(&self, _summary: &SessionSummary) {
        self.record_session_completed();
    }
}

/// Snapshot of monitoring statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringStats {
    pub ticks_evaluated: u64,
    pub alerts_emitted: u64,
    pub critical_alerts: u64,
    pub violations: u64,
    pub sampler_failures: u64,
    pub sessions_completed: u64,
    pub peak_suspicion: u64,
    pub monitoring_start: DateTime<Utc>,
    pub monitoring_duration_secs: u64,
}

/// Thread-safe shared monitoring log.
pub type SharedMonitoringLog = Arc<MonitoringLog>;

/// Create a new shared monitoring log.
pub fn create_shared_log() -> SharedMonitoringLog {
    Arc::new(MonitoringLog::new())
}
