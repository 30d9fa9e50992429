//! Integration tests for the session lifecycle and alert pipeline

use exam_proctor_agent::core::{AlertType, Severity, ThreatLevel};
use exam_proctor_agent::sampler::{SamplerError, ScriptStep, ScriptedSampler, SignalReading};
use exam_proctor_agent::session::{
    AlertFeed, AlertSink, ChannelSink, SessionController, SessionError, SessionEvent, SessionState,
    SessionSummary,
};
use exam_proctor_agent::{Alert, MonitoringLog, SessionConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Counts completion callbacks.
#[derive(Default)]
struct CompletionCounter {
    completions: AtomicUsize,
    alerts: AtomicUsize,
}

impl AlertSink for CompletionCounter {
    fn on_alert(&self, _session_id: &str, _alert: &Alert) {
        self.alerts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_session_complete(&self, _summary: &SessionSummary) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
}

fn identity_failure() -> SignalReading {
    SignalReading {
        identity_confidence: 40.0,
        ..SignalReading::default()
    }
}

fn scenario_reading(authenticity: f64) -> SignalReading {
    SignalReading {
        authenticity,
        attention: 30.0,
        stress: 90.0,
        identity_confidence: 40.0,
        identity_verified: Some(false),
        connection_stability: 50.0,
        surveillance_threat_score: Some(0.0),
        ..SignalReading::default()
    }
}

fn manual_session(
    config: SessionConfig,
    sampler: ScriptedSampler,
) -> SessionController<ScriptedSampler> {
    SessionController::new(config, sampler)
        .expect("valid config")
        .manual_ticks()
}

#[test]
fn test_double_stop_returns_same_summary() {
    let counter = Arc::new(CompletionCounter::default());
    let mut session = manual_session(
        SessionConfig::default(),
        ScriptedSampler::constant(identity_failure()),
    )
    .with_sink(counter.clone());

    session.start().unwrap();
    session.tick().unwrap();
    session.tick().unwrap();

    let first = session.stop().unwrap();
    let second = session.stop().unwrap();

    assert_eq!(first.session_id, second.session_id);
    assert_eq!(first.violation_count, second.violation_count);
    assert_eq!(first.ended_at, second.ended_at);
    assert_eq!(first.suspicion_history, second.suspicion_history);
    assert_eq!(counter.completions.load(Ordering::SeqCst), 1);
    assert_eq!(session.state(), SessionState::Stopped);
}

#[test]
fn test_stopped_session_cannot_restart() {
    let sampler = ScriptedSampler::constant(SignalReading::default());
    let probe = sampler.probe();
    let mut session = manual_session(SessionConfig::default(), sampler);

    session.start().unwrap();
    session.tick().unwrap();
    session.stop().unwrap();
    let (starts, samples) = (probe.starts(), probe.samples());

    let err = session.start().unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidState {
            operation: "start",
            state: SessionState::Stopped
        }
    ));
    assert!(matches!(session.tick(), Err(SessionError::InvalidState { .. })));

    // No device activity after the rejected calls
    assert_eq!(probe.starts(), starts);
    assert_eq!(probe.samples(), samples);
    assert!(!probe.devices_held());
}

#[test]
fn test_stop_from_idle_is_rejected() {
    let mut session = manual_session(
        SessionConfig::default(),
        ScriptedSampler::constant(SignalReading::default()),
    );
    assert!(matches!(
        session.stop(),
        Err(SessionError::InvalidState {
            operation: "stop",
            state: SessionState::Idle
        })
    ));
    assert!(session.summary().is_none());
}

#[test]
fn test_start_failure_stays_idle_and_retry_succeeds() {
    let sampler = ScriptedSampler::constant(SignalReading::default())
        .fail_next_start(SamplerError::PermissionDenied("camera".into()));
    let probe = sampler.probe();
    let mut session = manual_session(SessionConfig::default(), sampler);

    let err = session.start().unwrap_err();
    assert!(matches!(
        err,
        SessionError::SamplerUnavailable(SamplerError::PermissionDenied(_))
    ));
    assert!(err.is_retryable());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!probe.devices_held());

    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert!(probe.devices_held());
}

#[test]
fn test_devices_released_on_stop() {
    let sampler = ScriptedSampler::constant(SignalReading::default());
    let probe = sampler.probe();
    let mut session = manual_session(SessionConfig::default(), sampler);

    session.start().unwrap();
    assert!(probe.devices_held());
    session.stop().unwrap();
    assert!(!probe.devices_held());
    assert_eq!(probe.stops(), 1);

    // Second stop must not release twice
    session.stop().unwrap();
    assert_eq!(probe.stops(), 1);
}

#[test]
fn test_devices_released_on_drop() {
    let sampler = ScriptedSampler::constant(SignalReading::default());
    let probe = sampler.probe();
    {
        let mut session = manual_session(SessionConfig::default(), sampler);
        session.start().unwrap();
        session.tick().unwrap();
        assert!(probe.devices_held());
    }
    assert!(!probe.devices_held());
    assert_eq!(probe.stops(), 1);
}

#[test]
fn test_scenarios_through_session() {
    let mut readings = vec![identity_failure(); 3];
    readings.push(scenario_reading(40.0));
    readings.push(scenario_reading(10.0));
    let mut session = manual_session(SessionConfig::default(), ScriptedSampler::new(readings));
    session.start().unwrap();

    for _ in 0..3 {
        session.tick().unwrap();
    }
    assert_eq!(session.violation_count(), 3);

    let high = session.tick().unwrap();
    let assessment = high.assessment.unwrap();
    assert_eq!(assessment.suspicion_score, 70);
    assert_eq!(assessment.threat_level, ThreatLevel::High);
    assert_eq!(high.violation_delta, 1);
    assert_eq!(session.violation_count(), 4);

    let critical = session.tick().unwrap();
    let assessment = critical.assessment.unwrap();
    assert_eq!(assessment.suspicion_score, 79);
    assert_eq!(assessment.threat_level, ThreatLevel::Critical);
    assert_eq!(critical.violation_delta, 2);
    assert_eq!(session.violation_count(), 6);

    let risk = critical
        .alerts
        .iter()
        .find(|a| a.alert_type == AlertType::RiskPrediction)
        .unwrap();
    assert_eq!(risk.severity, Severity::Critical);
    assert!(risk.message.ends_with("after 4 prior violations"));

    let summary = session.stop().unwrap();
    assert_eq!(summary.final_suspicion_score, 79);
    assert_eq!(summary.peak_suspicion_score, 79);
    assert_eq!(summary.violation_count, 6);
    assert_eq!(summary.tick_count, 5);
    assert_eq!(summary.total_elapsed_seconds, 5);
}

#[test]
fn test_alert_log_capacity_through_session() {
    let config = SessionConfig {
        alert_capacity: 4,
        ..SessionConfig::default()
    };
    let mut session = manual_session(config, ScriptedSampler::constant(identity_failure()));
    session.start().unwrap();

    for _ in 0..10 {
        session.tick().unwrap();
    }

    let recent = session.recent_alerts(100);
    assert_eq!(recent.len(), 4);
    for pair in recent.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }

    let summary = session.stop().unwrap();
    assert_eq!(summary.recent_alerts.len(), 4);
    assert_eq!(summary.alert_count, 10);
}

#[test]
fn test_timer_session_ticks_and_halts() {
    let config = SessionConfig {
        tick_interval_ms: 10,
        ..SessionConfig::default()
    };
    let sampler = ScriptedSampler::constant(identity_failure());
    let probe = sampler.probe();
    let mut session = SessionController::new(config, sampler).unwrap();

    session.start().unwrap();
    thread::sleep(Duration::from_millis(150));
    let summary = session.stop().unwrap();

    assert!(summary.tick_count > 0);
    assert_eq!(summary.violation_count as u64, summary.tick_count);

    // The scheduler thread is joined by stop, so sampling has ended
    let samples = probe.samples();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(probe.samples(), samples);
    assert_eq!(session.tick_count(), summary.tick_count);
}

#[test]
fn test_sampler_loss_mid_session() {
    let sampler = ScriptedSampler::from_steps(vec![
        ScriptStep::Reading(identity_failure()),
        ScriptStep::Fail(SamplerError::Disconnected("microphone".into())),
        ScriptStep::Reading(SignalReading::default()),
    ]);
    let mut session = manual_session(SessionConfig::default(), sampler);
    session.start().unwrap();

    session.tick().unwrap();
    let lost = session.tick().unwrap();
    assert_eq!(lost.alerts.len(), 1);
    assert_eq!(lost.alerts[0].alert_type, AlertType::SamplerLost);
    assert_eq!(lost.alerts[0].severity, Severity::Critical);

    session.tick().unwrap();
    assert_eq!(session.state(), SessionState::Active);

    let summary = session.stop().unwrap();
    assert_eq!(summary.tick_count, 3);
    assert_eq!(summary.suspicion_history.len(), 2);
    assert_eq!(summary.violation_count, 1);
}

#[test]
fn test_feed_isolates_sessions() {
    let feed = AlertFeed::shared(20);
    let mut first = manual_session(
        SessionConfig::default(),
        ScriptedSampler::constant(identity_failure()),
    )
    .with_session_id("SESS-A")
    .with_sink(feed.clone());
    let mut second = manual_session(
        SessionConfig::default(),
        ScriptedSampler::constant(SignalReading::default()),
    )
    .with_session_id("SESS-B")
    .with_sink(feed.clone());

    first.start().unwrap();
    second.start().unwrap();
    for _ in 0..3 {
        first.tick().unwrap();
        second.tick().unwrap();
    }
    first.stop().unwrap();
    second.stop().unwrap();

    assert_eq!(feed.recent("SESS-A", 10).len(), 3);
    assert!(feed.recent("SESS-B", 10).is_empty());
    assert_eq!(feed.total_alerts(), 3);
    assert_eq!(feed.summary("SESS-A").unwrap().violation_count, 3);
    assert_eq!(feed.summary("SESS-B").unwrap().violation_count, 0);

    assert!(feed.forget("SESS-A"));
    assert!(feed.summary("SESS-A").is_none());
    assert_eq!(feed.sessions(), vec!["SESS-B"]);
}

#[test]
fn test_on_onset_condition_survives_camera_hiccup() {
    let config = SessionConfig {
        repeat_policy: exam_proctor_agent::RepeatPolicy::OnOnset,
        ..SessionConfig::default()
    };
    let sampler = ScriptedSampler::from_steps(vec![
        ScriptStep::Reading(identity_failure()),
        ScriptStep::Fail(SamplerError::Disconnected("camera".into())),
        ScriptStep::Reading(identity_failure()),
    ]);
    let mut session = manual_session(config, sampler);
    session.start().unwrap();
    for _ in 0..3 {
        session.tick().unwrap();
    }

    let summary = session.stop().unwrap();
    assert_eq!(summary.violation_count, 1);
    assert_eq!(summary.alert_count, 2);
}

#[test]
fn test_sinks_receive_alerts_and_completion() {
    let monitoring = Arc::new(MonitoringLog::new());
    let (sink, events) = ChannelSink::channel();
    let mut session = manual_session(
        SessionConfig::default(),
        ScriptedSampler::new(vec![scenario_reading(10.0)]),
    )
    .with_sink(Arc::new(sink))
    .with_sink(monitoring.clone());

    session.start().unwrap();
    let report = session.tick().unwrap();
    session.stop().unwrap();

    let received: Vec<SessionEvent> = events.try_iter().collect();
    let alerts: Vec<&Alert> = received
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Alert { alert, .. } => Some(alert),
            SessionEvent::Completed(_) => None,
        })
        .collect();
    assert_eq!(alerts.len(), report.alerts.len());
    assert!(matches!(received.last(), Some(SessionEvent::Completed(_))));

    let stats = monitoring.stats();
    assert_eq!(stats.ticks_evaluated, 1);
    assert_eq!(stats.alerts_emitted, report.alerts.len() as u64);
    assert_eq!(stats.violations, 2);
    assert_eq!(stats.sessions_completed, 1);
    assert_eq!(stats.peak_suspicion, 79);
}
