//! Transparency module for the Exam Proctor Agent.
//!
//! This module provides tools for tracking and exposing what the monitoring
//! engine did, supporting candidate trust and exam-board review.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, MonitoringLog, MonitoringStats, SharedMonitoringLog};
