//! Output contract for alerts and session summaries.

use crate::core::alerts::{Alert, Severity};
use crate::core::risk::RiskAssessment;
use crate::session::summary::SessionSummary;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{error, info, warn};

/// Consumer of session output.
///
/// Callbacks run synchronously on the tick thread, in alert order, so they
/// should return quickly.
pub trait AlertSink: Send + Sync {
    /// Called once per emitted alert.
    fn on_alert(&self, session_id: &str, alert: &Alert);

    /// Called after every tick that produced an assessment.
    fn on_tick(&self, _session_id: &str, _assessment: &RiskAssessment) {}

    /// Called exactly once when the session stops.
    fn on_session_complete(&self, _summary: &SessionSummary) {}
}

/// Event forwarded by [`ChannelSink`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Alert { session_id: String, alert: Alert },
    Completed(Box<SessionSummary>),
}

/// Forwards session output to a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<SessionEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver end of its channel.
    pub fn channel() -> (Self, Receiver<SessionEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl AlertSink for ChannelSink {
    fn on_alert(&self, session_id: &str, alert: &Alert) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.sender.send(SessionEvent::Alert {
            session_id: session_id.to_string(),
            alert: alert.clone(),
        });
    }

    fn on_session_complete(&self, summary: &SessionSummary) {
        let _ = self
            .sender
            .send(SessionEvent::Completed(Box::new(summary.clone())));
    }
}

/// Logs alerts through `tracing`, at a level matching their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AlertSink for TracingSink {
    fn on_alert(&self, session_id: &str, alert: &Alert) {
        match alert.severity {
            Severity::Critical => error!(
                session = session_id,
                kind = %alert.alert_type,
                confidence = alert.confidence,
                "{}",
                alert.message
            ),
            Severity::High | Severity::Medium => warn!(
                session = session_id,
                kind = %alert.alert_type,
                confidence = alert.confidence,
                "{}",
                alert.message
            ),
            Severity::Low => info!(
                session = session_id,
                kind = %alert.alert_type,
                "{}",
                alert.message
            ),
        }
    }

    fn on_session_complete(&self, summary: &SessionSummary) {
        info!(
            session = %summary.session_id,
            violations = summary.violation_count,
            alerts = summary.alert_count,
            final_score = summary.final_suspicion_score,
            "Session complete"
        );
    }
}
