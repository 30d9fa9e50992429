//! Session error taxonomy.

use crate::config::ConfigError;
use crate::sampler::SamplerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a session. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Idle,
    Active,
    Stopped,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Active => "ACTIVE",
            SessionState::Stopped => "STOPPED",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Illegal lifecycle transition. A caller bug; do not retry.
    #[error("cannot {operation} a session in state {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The sampler could not acquire its devices. The session stays idle
    /// and `start` may be retried.
    #[error("signal sampler unavailable: {0}")]
    SamplerUnavailable(#[from] SamplerError),

    /// Out-of-range configuration. A caller bug; do not retry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The tick scheduler thread could not be spawned.
    #[error("failed to start tick scheduler: {0}")]
    Scheduler(String),
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Invalid(msg) => SessionError::Configuration(msg),
            other => SessionError::Configuration(other.to_string()),
        }
    }
}

impl SessionError {
    /// Whether the caller may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::SamplerUnavailable(_))
    }
}
