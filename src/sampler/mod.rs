//! Signal sampling for the proctoring engine.
//!
//! There is no vision or audio backend; samplers stand in for the models a
//! real client would run. The engine only depends on the [`SignalSampler`]
//! contract.

pub mod scripted;
pub mod simulated;
pub mod types;

// Re-export commonly used types
pub use scripted::{SamplerProbe, ScriptStep, ScriptedSampler};
pub use simulated::{SimulatedConfig, SimulatedSampler};
pub use types::{clamp_score, SamplerError, SignalReading, SignalSampler, SCORE_MAX};
