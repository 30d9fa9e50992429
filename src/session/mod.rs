//! Session lifecycle for the Exam Proctor Agent.
//!
//! This module contains:
//! - The session controller and its tick scheduler
//! - Output sinks for alerts and summaries
//! - A centralized alert feed for multi-session monitoring

pub mod controller;
pub mod error;
pub mod feed;
pub mod scheduler;
pub mod sink;
pub mod summary;

// Re-export commonly used types
pub use controller::{SessionController, TickMode, TickReport};
pub use error::{SessionError, SessionState};
pub use feed::{AlertFeed, SharedAlertFeed};
pub use scheduler::TickScheduler;
pub use sink::{AlertSink, ChannelSink, SessionEvent, TracingSink};
pub use summary::{SessionSummary, SuspicionStats};
