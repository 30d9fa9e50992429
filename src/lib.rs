//! Exam Proctor Agent - risk aggregation and alerting for exam proctoring.
//!
//! This library turns per-tick signal readings (identity confidence,
//! attention, stress, voice and connection quality, an optional surveillance
//! model score) into a bounded suspicion score, a threat level and a capped,
//! severity-ranked alert feed. All signals come from samplers standing in
//! for vision and audio models; no such models ship with this crate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Exam Proctor Agent                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Sampler   │──▶│    Risk     │──▶│  Alert Log  │       │
//! │  │ (per tick)  │   │ Aggregator  │   │ (capped 20) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                                    │              │
//! │         │                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │   Session   │────── summary ─────▶│    Sinks    │       │
//! │  │ Controller  │                     │ feed / log  │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use exam_proctor_agent::{sampler, session, SessionConfig};
//!
//! let sampler = sampler::SimulatedSampler::new(sampler::SimulatedConfig::default());
//! let mut session = session::SessionController::new(SessionConfig::default(), sampler)
//!     .expect("valid config");
//!
//! session.start().expect("camera available");
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! let summary = session.stop().expect("session was active");
//! println!("{}", summary.display());
//! ```

pub mod config;
pub mod core;
pub mod sampler;
pub mod session;
pub mod store;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, Preset, RepeatPolicy, SessionConfig};
pub use core::{
    Alert, AlertLog, AlertType, RiskAggregator, RiskAssessment, RiskProfile, Severity, ThreatLevel,
};
pub use sampler::{SamplerError, SignalReading, SignalSampler};
pub use session::{
    AlertFeed, AlertSink, SessionController, SessionError, SessionState, SessionSummary,
};
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};
pub use transparency::{MonitoringLog, MonitoringStats, SharedMonitoringLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Monitoring disclosure that can be displayed to candidates.
pub const MONITORING_DISCLOSURE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║           EXAM PROCTOR AGENT - MONITORING DISCLOSURE             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This session is monitored for exam integrity.                   ║
║                                                                  ║
║  ✓ WHAT IS SCORED EACH SECOND:                                   ║
║    • Identity confidence and liveness                            ║
║    • Attention, stress and engagement estimates                  ║
║    • Voice and environment quality                               ║
║    • Connection stability                                        ║
║                                                                  ║
║  ✗ WHAT IS NEVER STORED:                                         ║
║    • Camera images or video                                      ║
║    • Microphone audio                                            ║
║    • Keystrokes or screen content                                ║
║                                                                  ║
║  In this demo every signal is simulated. Alerts are kept for     ║
║  the session only and discarded when it ends.                    ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disclosure_contents() {
        assert!(MONITORING_DISCLOSURE.contains("DISCLOSURE"));
        assert!(MONITORING_DISCLOSURE.contains("NEVER STORED"));
        assert!(MONITORING_DISCLOSURE.contains("simulated"));
    }
}
