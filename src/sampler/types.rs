//! Signal types consumed by the risk engine.
//!
//! A [`SignalReading`] is the per-tick output of whatever stands in for the
//! camera, microphone and network probes. Every bounded sub-score lives on a
//! 0-100 scale.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound of every bounded sub-score.
pub const SCORE_MAX: f64 = 100.0;

/// One bundle of independently produced sub-scores for a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    /// Face-match confidence (0-100)
    pub identity_confidence: f64,
    /// Explicit verdict from the sampler, if it reports one. `Some(false)`
    /// fails verification regardless of confidence; `Some(true)` cannot pass
    /// a reading whose confidence is at or below the threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_verified: Option<bool>,
    /// Gaze-on-screen attention (0-100)
    pub attention: f64,
    /// Stress estimate (0-100)
    pub stress: f64,
    /// Engagement estimate (0-100)
    pub engagement: f64,
    /// Liveness / authenticity of the presented face and voice (0-100)
    pub authenticity: f64,
    pub voice_clarity: f64,
    pub voice_naturalness: f64,
    pub voice_consistency: f64,
    /// Lighting, background and noise composite (0-100)
    pub environment_quality: f64,
    /// Network stability (0-100)
    pub connection_stability: f64,
    /// Round-trip latency in milliseconds (>= 0)
    pub connection_latency_ms: f64,
    /// Surveillance-model threat score, only present while surveillance
    /// integration is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surveillance_threat_score: Option<f64>,
}

impl Default for SignalReading {
    /// A calm, fully verified reading.
    fn default() -> Self {
        Self {
            identity_confidence: 95.0,
            identity_verified: None,
            attention: 90.0,
            stress: 20.0,
            engagement: 85.0,
            authenticity: 95.0,
            voice_clarity: 90.0,
            voice_naturalness: 90.0,
            voice_consistency: 90.0,
            environment_quality: 90.0,
            connection_stability: 95.0,
            connection_latency_ms: 40.0,
            surveillance_threat_score: None,
        }
    }
}

impl SignalReading {
    /// Return a copy with every bounded score clamped into `[0, 100]`.
    ///
    /// NaN maps to 0 so a broken probe can never poison the composite.
    pub fn clamped(&self) -> Self {
        Self {
            identity_confidence: clamp_score(self.identity_confidence),
            identity_verified: self.identity_verified,
            attention: clamp_score(self.attention),
            stress: clamp_score(self.stress),
            engagement: clamp_score(self.engagement),
            authenticity: clamp_score(self.authenticity),
            voice_clarity: clamp_score(self.voice_clarity),
            voice_naturalness: clamp_score(self.voice_naturalness),
            voice_consistency: clamp_score(self.voice_consistency),
            environment_quality: clamp_score(self.environment_quality),
            connection_stability: clamp_score(self.connection_stability),
            connection_latency_ms: if self.connection_latency_ms.is_nan() {
                0.0
            } else {
                self.connection_latency_ms.max(0.0)
            },
            surveillance_threat_score: self.surveillance_threat_score.map(clamp_score),
        }
    }

    /// Whether the identity check passes against the given confidence threshold.
    ///
    /// Confidence must exceed the threshold; an explicit `Some(false)`
    /// from the sampler vetoes an otherwise passing reading.
    pub fn identity_verified(&self, threshold: f64) -> bool {
        self.identity_confidence > threshold && self.identity_verified != Some(false)
    }

    /// Whether the sampler vetoed a reading whose confidence alone would pass.
    pub fn identity_vetoed(&self, threshold: f64) -> bool {
        self.identity_confidence > threshold && self.identity_verified == Some(false)
    }

    /// Drop the surveillance score, as if the integration were inactive.
    pub fn without_surveillance(mut self) -> Self {
        self.surveillance_threat_score = None;
        self
    }

    /// Mean of the three voice sub-scores.
    pub fn voice_quality(&self) -> f64 {
        (self.voice_clarity + self.voice_naturalness + self.voice_consistency) / 3.0
    }
}

/// Clamp a single score into `[0, 100]`, mapping NaN to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, SCORE_MAX)
    }
}

/// Failures reported by a signal sampler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplerError {
    #[error("permission denied for {0}")]
    PermissionDenied(String),
    #[error("device not found: {0}")]
    DeviceMissing(String),
    #[error("device disconnected: {0}")]
    Disconnected(String),
    #[error("sampler is already running")]
    AlreadyRunning,
}

/// Source of per-tick signal readings.
///
/// `start` acquires the underlying devices and `stop` releases them. The
/// session controller guarantees `stop` is called on every exit path once
/// `start` has succeeded.
pub trait SignalSampler: Send {
    /// Acquire devices. Failing here keeps the session idle.
    fn start(&mut self) -> Result<(), SamplerError>;

    /// Produce the reading for the current tick.
    fn sample(&mut self) -> Result<SignalReading, SamplerError>;

    /// Release devices. Must be safe to call more than once.
    fn stop(&mut self);

    /// Whether devices are currently held.
    fn is_running(&self) -> bool;
}

impl<S: SignalSampler + ?Sized> SignalSampler for Box<S> {
    fn start(&mut self) -> Result<(), SamplerError> {
        (**self).start()
    }

    fn sample(&mut self) -> Result<SignalReading, SamplerError> {
        (**self).sample()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_bounds_every_score() {
        let reading = SignalReading {
            identity_confidence: 140.0,
            attention: -10.0,
            stress: f64::NAN,
            connection_latency_ms: -5.0,
            surveillance_threat_score: Some(250.0),
            ..SignalReading::default()
        };

        let clamped = reading.clamped();
        assert_eq!(clamped.identity_confidence, 100.0);
        assert_eq!(clamped.attention, 0.0);
        assert_eq!(clamped.stress, 0.0);
        assert_eq!(clamped.connection_latency_ms, 0.0);
        assert_eq!(clamped.surveillance_threat_score, Some(100.0));
    }

    #[test]
    fn test_identity_verified_threshold() {
        let mut reading = SignalReading {
            identity_confidence: 75.0,
            ..SignalReading::default()
        };
        assert!(!reading.identity_verified(75.0));

        reading.identity_confidence = 75.5;
        assert!(reading.identity_verified(75.0));

        reading.identity_verified = Some(false);
        assert!(!reading.identity_verified(75.0));
        assert!(reading.identity_vetoed(75.0));
    }

    #[test]
    fn test_explicit_pass_cannot_override_low_confidence() {
        let reading = SignalReading {
            identity_confidence: 10.0,
            identity_verified: Some(true),
            ..SignalReading::default()
        };
        assert!(!reading.identity_verified(75.0));
        assert!(!reading.identity_vetoed(75.0));

        let confident = SignalReading {
            identity_verified: Some(true),
            ..SignalReading::default()
        };
        assert!(confident.identity_verified(75.0));
    }

    #[test]
    fn test_without_surveillance() {
        let reading = SignalReading {
            surveillance_threat_score: Some(80.0),
            ..SignalReading::default()
        };
        assert!(reading.without_surveillance().surveillance_threat_score.is_none());
    }
}
