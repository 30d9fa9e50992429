//! Session lifecycle and the per-tick pipeline.
//!
//! ```text
//!   IDLE ──start()──▶ ACTIVE ──stop()──▶ STOPPED
//!    ▲                  │
//!    └─ sampler failed ─┘ (start only)
//! ```
//!
//! Each tick pulls a reading from the sampler, evaluates it, filters alerts
//! through the repeat policy, appends them to the alert log and fans them
//! out to the sinks. All pipeline state sits behind one mutex, so timer
//! ticks and manual ticks never interleave.

use crate::config::{RepeatPolicy, SessionConfig};
use crate::core::alerts::{Alert, AlertLog, AlertType};
use crate::core::risk::{RiskAggregator, RiskAssessment};
use crate::sampler::types::SignalSampler;
use crate::session::error::{SessionError, SessionState};
use crate::session::scheduler::TickScheduler;
use crate::session::sink::AlertSink;
use crate::session::summary::{SessionSummary, SuspicionStats};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How ticks are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// A scheduler thread ticks at the configured interval
    Timer,
    /// The caller drives ticks with [`SessionController::tick`]
    Manual,
}

/// What one tick produced.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    /// `None` when the sampler failed this tick
    pub assessment: Option<RiskAssessment>,
    /// Alerts emitted after the repeat policy, most severe first
    pub alerts: Vec<Alert>,
    pub violation_delta: u32,
}

/// Pipeline state owned by one session.
struct SessionEngine<S> {
    session_id: String,
    sampler: S,
    aggregator: RiskAggregator,
    log: AlertLog,
    sinks: Vec<Arc<dyn AlertSink>>,
    repeat_policy: RepeatPolicy,
    surveillance_enabled: bool,
    tick_interval_ms: u64,
    assessment: Option<RiskAssessment>,
    violation_count: u32,
    tick_count: u64,
    suspicion_history: Vec<u8>,
    // Alert kinds whose condition held on the previous tick
    last_conditions: BTreeSet<AlertType>,
}

impl<S: SignalSampler> SessionEngine<S> {
    fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        self.tick_count += 1;

        let (assessment, candidates) = match self.sampler.sample() {
            Ok(reading) => {
                let reading = if self.surveillance_enabled {
                    reading
                } else {
                    reading.without_surveillance()
                };
                let evaluation = self
                    .aggregator
                    .evaluate_at(&reading, self.violation_count, now);
                (Some(evaluation.assessment), evaluation.alerts)
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "Sampler lost during tick");
                (None, vec![Alert::sampler_lost(now, &e.to_string())])
            }
        };

        let mut conditions: BTreeSet<AlertType> =
            candidates.iter().map(|a| a.alert_type).collect();
        if assessment.is_none() {
            // A lost sample says nothing about the other conditions
            conditions.extend(self.last_conditions.iter().copied());
        }
        let alerts: Vec<Alert> = match self.repeat_policy {
            RepeatPolicy::EveryTick => candidates,
            RepeatPolicy::OnOnset => candidates
                .into_iter()
                .filter(|a| !self.last_conditions.contains(&a.alert_type))
                .collect(),
        };
        self.last_conditions = conditions;

        let violation_delta = alerts
            .iter()
            .filter(|a| a.alert_type.is_violation())
            .count() as u32;
        self.violation_count += violation_delta;

        if let Some(ref assessment) = assessment {
            self.suspicion_history.push(assessment.suspicion_score);
            debug!(
                session = %self.session_id,
                tick = self.tick_count,
                score = assessment.suspicion_score,
                level = %assessment.threat_level,
                alerts = alerts.len(),
                "Tick evaluated"
            );
            for sink in &self.sinks {
                sink.on_tick(&self.session_id, assessment);
            }
            self.assessment = Some(assessment.clone());
        }

        for alert in &alerts {
            self.log.append(alert.clone());
            for sink in &self.sinks {
                sink.on_alert(&self.session_id, alert);
            }
        }

        TickReport {
            tick: self.tick_count,
            assessment,
            alerts,
            violation_delta,
        }
    }

    fn elapsed_seconds(&self) -> u64 {
        elapsed_seconds(self.tick_count, self.tick_interval_ms)
    }

    fn summarize(
        &self,
        station_id: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> SessionSummary {
        let stats = SuspicionStats::from_history(&self.suspicion_history);
        SessionSummary {
            session_id: self.session_id.clone(),
            station_id,
            started_at,
            ended_at,
            total_elapsed_seconds: self.elapsed_seconds(),
            tick_count: self.tick_count,
            violation_count: self.violation_count,
            final_suspicion_score: self
                .assessment
                .as_ref()
                .map(|a| a.suspicion_score)
                .unwrap_or(0),
            alert_count: self.log.total_appended(),
            peak_suspicion_score: stats.peak,
            mean_suspicion_score: stats.mean,
            suspicion_std_dev: stats.std_dev,
            suspicion_history: self.suspicion_history.clone(),
            recent_alerts: self.log.snapshot(),
            last_assessment: self.assessment.clone(),
        }
    }
}

/// Owns one proctoring session: lifecycle, scheduler, devices and results.
pub struct SessionController<S: SignalSampler + 'static> {
    config: SessionConfig,
    state: SessionState,
    mode: TickMode,
    engine: Arc<Mutex<SessionEngine<S>>>,
    scheduler: Option<TickScheduler>,
    started_at: Option<DateTime<Utc>>,
    summary: Option<SessionSummary>,
}

impl<S: SignalSampler + 'static> SessionController<S> {
    /// Create an idle session. Fails on invalid configuration.
    pub fn new(config: SessionConfig, sampler: S) -> Result<Self, SessionError> {
        config.validate()?;

        let session_id = format!(
            "SESS-{}-{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8]
        );

        let engine = SessionEngine {
            session_id,
            sampler,
            aggregator: RiskAggregator::new(config.profile),
            log: AlertLog::new(config.alert_capacity),
            sinks: Vec::new(),
            repeat_policy: config.repeat_policy,
            surveillance_enabled: config.surveillance_enabled,
            tick_interval_ms: config.tick_interval_ms,
            assessment: None,
            violation_count: 0,
            tick_count: 0,
            suspicion_history: Vec::new(),
            last_conditions: BTreeSet::new(),
        };

        Ok(Self {
            config,
            state: SessionState::Idle,
            mode: TickMode::Timer,
            engine: Arc::new(Mutex::new(engine)),
            scheduler: None,
            started_at: None,
            summary: None,
        })
    }

    /// Drive ticks manually instead of with the scheduler thread.
    pub fn manual_ticks(mut self) -> Self {
        self.mode = TickMode::Manual;
        self
    }

    /// Use a caller-chosen session id.
    pub fn with_session_id(self, session_id: impl Into<String>) -> Self {
        self.engine.lock().session_id = session_id.into();
        self
    }

    /// Register an output sink.
    pub fn with_sink(self, sink: Arc<dyn AlertSink>) -> Self {
        self.engine.lock().sinks.push(sink);
        self
    }

    /// Acquire devices and begin ticking.
    ///
    /// Valid only from `Idle`. A sampler failure leaves the session idle so
    /// the caller can retry.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        let session_id = {
            let mut engine = self.engine.lock();
            if let Err(e) = engine.sampler.start() {
                warn!(session = %engine.session_id, error = %e, "Sampler unavailable at start");
                return Err(SessionError::SamplerUnavailable(e));
            }
            engine.session_id.clone()
        };

        if self.mode == TickMode::Timer {
            let engine = Arc::clone(&self.engine);
            let spawned = TickScheduler::spawn(
                format!("tick-{session_id}"),
                self.config.tick_interval(),
                move || {
                    engine.lock().tick(Utc::now());
                },
            );
            match spawned {
                Ok(scheduler) => self.scheduler = Some(scheduler),
                Err(e) => {
                    self.engine.lock().sampler.stop();
                    return Err(SessionError::Scheduler(e.to_string()));
                }
            }
        }

        self.state = SessionState::Active;
        self.started_at = Some(Utc::now());
        info!(
            session = %session_id,
            interval_ms = self.config.tick_interval_ms,
            surveillance = self.config.surveillance_enabled,
            "Session started"
        );
        Ok(())
    }

    /// Run one pipeline step now. Valid only while `Active`.
    pub fn tick(&mut self) -> Result<TickReport, SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::InvalidState {
                operation: "tick",
                state: self.state,
            });
        }
        Ok(self.engine.lock().tick(Utc::now()))
    }

    /// Halt ticking, release devices and return the session summary.
    ///
    /// The first call from `Active` builds the summary and notifies sinks.
    /// Later calls return the same summary without notifying again.
    pub fn stop(&mut self) -> Result<SessionSummary, SessionError> {
        match self.state {
            SessionState::Stopped => {
                if let Some(ref summary) = self.summary {
                    return Ok(summary.clone());
                }
                return Err(SessionError::InvalidState {
                    operation: "stop",
                    state: self.state,
                });
            }
            SessionState::Idle => {
                return Err(SessionError::InvalidState {
                    operation: "stop",
                    state: self.state,
                });
            }
            SessionState::Active => {}
        }

        // Joins the scheduler thread before anything else is torn down
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.cancel();
        }

        let ended_at = Utc::now();
        let started_at = self.started_at.unwrap_or(ended_at);
        let (summary, sinks) = {
            let mut engine = self.engine.lock();
            engine.sampler.stop();
            (
                engine.summarize(station_id(), started_at, ended_at),
                engine.sinks.clone(),
            )
        };

        self.state = SessionState::Stopped;
        self.summary = Some(summary.clone());

        info!(
            session = %summary.session_id,
            elapsed_secs = summary.total_elapsed_seconds,
            violations = summary.violation_count,
            alerts = summary.alert_count,
            "Session stopped"
        );

        for sink in &sinks {
            sink.on_session_complete(&summary);
        }

        Ok(summary)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> String {
        self.engine.lock().session_id.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Latest assessment, `None` before the first evaluated tick.
    pub fn assessment(&self) -> Option<RiskAssessment> {
        self.engine.lock().assessment.clone()
    }

    /// Up to `k` newest alerts, newest first.
    pub fn recent_alerts(&self, k: usize) -> Vec<Alert> {
        self.engine.lock().log.recent(k)
    }

    pub fn violation_count(&self) -> u32 {
        self.engine.lock().violation_count
    }

    pub fn tick_count(&self) -> u64 {
        self.engine.lock().tick_count
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.engine.lock().elapsed_seconds()
    }

    /// Summary cached by the first successful `stop`.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }
}

impl<S: SignalSampler + 'static> Drop for SessionController<S> {
    fn drop(&mut self) {
        if self.state == SessionState::Active {
            if let Some(scheduler) = self.scheduler.take() {
                scheduler.cancel();
            }
            let mut engine = self.engine.lock();
            engine.sampler.stop();
            debug!(session = %engine.session_id, "Active session dropped; devices released");
        }
    }
}

/// Session time covered by `ticks` ticks, in whole seconds.
fn elapsed_seconds(ticks: u64, interval_ms: u64) -> u64 {
    ticks.saturating_mul(interval_ms) / 1000
}

/// Host name used to tag summaries.
fn station_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-station".to_string())
}
