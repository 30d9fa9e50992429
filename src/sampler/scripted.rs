//! Deterministic sampler that replays a fixed script of readings.
//!
//! Used by tests and demos to drive the engine without any randomness.

use crate::sampler::types::{SamplerError, SignalReading, SignalSampler};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// One scripted step: either a reading or a sampler failure.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Reading(SignalReading),
    Fail(SamplerError),
}

/// Counters shared with the test that owns the sampler, so device handling
/// can be observed after the sampler moves into a session.
#[derive(Debug, Default)]
pub struct SamplerProbe {
    starts: AtomicU64,
    stops: AtomicU64,
    samples: AtomicU64,
    held: AtomicBool,
}

impl SamplerProbe {
    pub fn starts(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u64 {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::SeqCst)
    }

    /// Whether devices are currently acquired.
    pub fn devices_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

/// Sampler replaying scripted steps in order.
///
/// When the script runs out, the last reading is repeated (or the default
/// reading if the script never held one).
pub struct ScriptedSampler {
    steps: VecDeque<ScriptStep>,
    last: SignalReading,
    start_failure: Option<SamplerError>,
    running: bool,
    probe: Arc<SamplerProbe>,
}

impl ScriptedSampler {
    /// Create a sampler that replays the given readings.
    pub fn new(readings: impl IntoIterator<Item = SignalReading>) -> Self {
        Self::from_steps(readings.into_iter().map(ScriptStep::Reading))
    }

    /// Create a sampler from explicit steps, including failures.
    pub fn from_steps(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            last: SignalReading::default(),
            start_failure: None,
            running: false,
            probe: Arc::new(SamplerProbe::default()),
        }
    }

    /// Sampler that always returns the same reading.
    pub fn constant(reading: SignalReading) -> Self {
        let mut sampler = Self::new(std::iter::empty());
        sampler.last = reading;
        sampler
    }

    /// Make the next `start` call fail once with the given error.
    pub fn fail_next_start(mut self, error: SamplerError) -> Self {
        self.start_failure = Some(error);
        self
    }

    /// Shared counters for observing device handling.
    pub fn probe(&self) -> Arc<SamplerProbe> {
        Arc::clone(&self.probe)
    }
}

impl SignalSampler for ScriptedSampler {
    fn start(&mut self) -> Result<(), SamplerError> {
        if self.running {
            return Err(SamplerError::AlreadyRunning);
        }
        if let Some(error) = self.start_failure.take() {
            return Err(error);
        }
        self.running = true;
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        self.probe.held.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn sample(&mut self) -> Result<SignalReading, SamplerError> {
        self.probe.samples.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front() {
            Some(ScriptStep::Reading(reading)) => {
                self.last = reading.clone();
                Ok(reading)
            }
            Some(ScriptStep::Fail(error)) => Err(error),
            None => Ok(self.last.clone()),
        }
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.probe.stops.fetch_add(1, Ordering::SeqCst);
            self.probe.held.store(false, Ordering::SeqCst);
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
