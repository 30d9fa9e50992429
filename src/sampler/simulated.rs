//! Pseudo-random sampler standing in for the camera, microphone and network
//! probes of a real proctoring client.
//!
//! Readings wander around a calm baseline and occasionally enter a short
//! "incident" (candidate looks away, face leaves frame, network drops) so a
//! demo session produces a realistic mix of quiet ticks and alerts.

use crate::sampler::types::{clamp_score, SamplerError, SignalReading, SignalSampler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Configuration for the simulated sampler.
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// Emit a surveillance-model threat score each tick
    pub surveillance: bool,
    /// Pretend the camera permission prompt was granted
    pub camera_available: bool,
    /// Probability per tick of starting an incident (0-1)
    pub incident_rate: f64,
    /// Seed for reproducible runs; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            surveillance: false,
            camera_available: true,
            incident_rate: 0.08,
            seed: None,
        }
    }
}

/// Kind of simulated incident currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Incident {
    LookingAway,
    FaceLost,
    NetworkDrop,
    Stressed,
}

/// Random-walk sampler with occasional incidents.
pub struct SimulatedSampler {
    config: SimulatedConfig,
    rng: StdRng,
    running: bool,
    incident: Option<(Incident, u32)>,
    attention: f64,
    stress: f64,
}

impl SimulatedSampler {
    /// Create a new simulated sampler.
    pub fn new(config: SimulatedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            running: false,
            incident: None,
            attention: 85.0,
            stress: 25.0,
        }
    }

    /// Advance the incident state machine by one tick.
    fn step_incident(&mut self) -> Option<Incident> {
        match self.incident {
            Some((kind, remaining)) if remaining > 1 => {
                self.incident = Some((kind, remaining - 1));
                Some(kind)
            }
            Some(_) => {
                self.incident = None;
                None
            }
            None => {
                if self.rng.gen_bool(self.config.incident_rate.clamp(0.0, 1.0)) {
                    let kind = match self.rng.gen_range(0..4) {
                        0 => Incident::LookingAway,
                        1 => Incident::FaceLost,
                        2 => Incident::NetworkDrop,
                        _ => Incident::Stressed,
                    };
                    let duration = self.rng.gen_range(2..6);
                    self.incident = Some((kind, duration));
                    Some(kind)
                } else {
                    None
                }
            }
        }
    }

    fn jitter(&mut self, spread: f64) -> f64 {
        self.rng.gen_range(-spread..=spread)
    }
}

impl SignalSampler for SimulatedSampler {
    fn start(&mut self) -> Result<(), SamplerError> {
        if self.running {
            return Err(SamplerError::AlreadyRunning);
        }
        if !self.config.camera_available {
            return Err(SamplerError::PermissionDenied("camera".to_string()));
        }
        self.running = true;
        Ok(())
    }

    fn sample(&mut self) -> Result<SignalReading, SamplerError> {
        if !self.running {
            return Err(SamplerError::Disconnected("camera".to_string()));
        }

        let incident = self.step_incident();

        // Slow random walk for the behavioral channels
        let da = self.jitter(4.0);
        let ds = self.jitter(3.0);
        self.attention = clamp_score(self.attention + da).max(55.0);
        self.stress = clamp_score(self.stress + ds).min(60.0);

        let mut reading = SignalReading {
            identity_confidence: 88.0 + self.jitter(8.0),
            identity_verified: None,
            attention: self.attention,
            stress: self.stress,
            engagement: 80.0 + self.jitter(10.0),
            authenticity: 90.0 + self.jitter(8.0),
            voice_clarity: 85.0 + self.jitter(10.0),
            voice_naturalness: 88.0 + self.jitter(8.0),
            voice_consistency: 86.0 + self.jitter(8.0),
            environment_quality: 82.0 + self.jitter(12.0),
            connection_stability: 92.0 + self.jitter(6.0),
            connection_latency_ms: 45.0 + self.jitter(25.0),
            surveillance_threat_score: None,
        };

        match incident {
            Some(Incident::LookingAway) => {
                reading.attention = 20.0 + self.jitter(15.0);
                reading.engagement = 35.0 + self.jitter(10.0);
            }
            Some(Incident::FaceLost) => {
                reading.identity_confidence = 35.0 + self.jitter(20.0);
                reading.authenticity = 30.0 + self.jitter(20.0);
                reading.attention = 25.0 + self.jitter(10.0);
            }
            Some(Incident::NetworkDrop) => {
                reading.connection_stability = 35.0 + self.jitter(15.0);
                reading.connection_latency_ms = 600.0 + self.jitter(300.0);
            }
            Some(Incident::Stressed) => {
                reading.stress = 88.0 + self.jitter(8.0);
                reading.voice_consistency = 55.0 + self.jitter(10.0);
            }
            None => {}
        }

        if self.config.surveillance {
            let base = if incident.is_some() { 65.0 } else { 15.0 };
            reading.surveillance_threat_score = Some(base + self.jitter(15.0));
        }

        Ok(reading.clamped())
    }

    fn stop(&mut self) {
        self.running = false;
        self.incident = None;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(surveillance: bool) -> SimulatedSampler {
        SimulatedSampler::new(SimulatedConfig {
            surveillance,
            seed: Some(7),
            ..SimulatedConfig::default()
        })
    }

    #[test]
    fn test_denied_camera_fails_start() {
        let mut sampler = SimulatedSampler::new(SimulatedConfig {
            camera_available: false,
            ..SimulatedConfig::default()
        });
        assert!(matches!(
            sampler.start(),
            Err(SamplerError::PermissionDenied(_))
        ));
        assert!(!sampler.is_running());
    }

    #[test]
    fn test_double_start_rejected() {
        let mut sampler = seeded(false);
        sampler.start().unwrap();
        assert_eq!(sampler.start(), Err(SamplerError::AlreadyRunning));
    }

    #[test]
    fn test_sample_requires_start() {
        let mut sampler = seeded(false);
        assert!(sampler.sample().is_err());
    }

    #[test]
    fn test_readings_stay_in_range() {
        let mut sampler = seeded(true);
        sampler.start().unwrap();

        for _ in 0..500 {
            let r = sampler.sample().unwrap();
            for v in [
                r.identity_confidence,
                r.attention,
                r.stress,
                r.engagement,
                r.authenticity,
                r.voice_clarity,
                r.voice_naturalness,
                r.voice_consistency,
                r.environment_quality,
                r.connection_stability,
            ] {
                assert!((0.0..=100.0).contains(&v));
            }
            assert!(r.connection_latency_ms >= 0.0);
            assert!(r.surveillance_threat_score.is_some());
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = seeded(false);
        let mut b = seeded(false);
        a.start().unwrap();
        b.start().unwrap();
        for _ in 0..20 {
            assert_eq!(a.sample().unwrap(), b.sample().unwrap());
        }
    }
}
