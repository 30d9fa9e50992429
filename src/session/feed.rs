//! Centralized alert feed for monitoring many sessions at once.
//!
//! Each session writes only to the log under its own key, so concurrent
//! sessions cannot corrupt each other's history.

use crate::core::alerts::{Alert, AlertLog};
use crate::session::sink::AlertSink;
use crate::session::summary::SessionSummary;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-session alert logs plus completed summaries.
#[derive(Debug)]
pub struct AlertFeed {
    capacity: usize,
    logs: RwLock<HashMap<String, AlertLog>>,
    completed: RwLock<HashMap<String, SessionSummary>>,
}

/// Thread-safe shared alert feed.
pub type SharedAlertFeed = Arc<AlertFeed>;

impl AlertFeed {
    /// Create a feed retaining up to `capacity` alerts per session.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            logs: RwLock::new(HashMap::new()),
            completed: RwLock::new(HashMap::new()),
        }
    }

    pub fn shared(capacity: usize) -> SharedAlertFeed {
        Arc::new(Self::new(capacity))
    }

    /// Up to `k` newest alerts for one session, newest first.
    pub fn recent(&self, session_id: &str, k: usize) -> Vec<Alert> {
        self.logs
            .read()
            .get(session_id)
            .map(|log| log.recent(k))
            .unwrap_or_default()
    }

    /// Up to `k` newest alerts across every session, newest first.
    pub fn recent_all(&self, k: usize) -> Vec<(String, Alert)> {
        let logs = self.logs.read();
        let mut merged: Vec<(String, Alert)> = logs
            .iter()
            .flat_map(|(id, log)| log.iter().take(k).map(move |a| (id.clone(), a.clone())))
            .collect();
        merged.sort_by(|a, b| {
            b.1.timestamp
                .cmp(&a.1.timestamp)
                .then_with(|| a.0.cmp(&b.0))
        });
        merged.truncate(k);
        merged
    }

    /// Sessions that have reported at least one alert or completed.
    pub fn sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.logs.read().keys().cloned().collect();
        for id in self.completed.read().keys() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids.sort();
        ids
    }

    /// Alerts appended across all sessions, including evicted ones.
    pub fn total_alerts(&self) -> u64 {
        self.logs.read().values().map(|log| log.total_appended()).sum()
    }

    /// Drop everything kept for one session. Returns whether anything was held.
    pub fn forget(&self, session_id: &str) -> bool {
        let had_log = self.logs.write().remove(session_id).is_some();
        let had_summary = self.completed.write().remove(session_id).is_some();
        had_log || had_summary
    }

    /// Summary of a completed session.
    pub fn summary(&self, session_id: &str) -> Option<SessionSummary> {
        self.completed.read().get(session_id).cloned()
    }
}

impl AlertSink for AlertFeed {
    fn on_alert(&self, session_id: &str, alert: &Alert) {
        let mut logs = self.logs.write();
        logs.entry(session_id.to_string())
            .or_insert_with(|| AlertLog::new(self.capacity))
            .append(alert.clone());
    }

    fn on_session_complete(&self, summary: &SessionSummary) {
        self.completed
            .write()
            .insert(summary.session_id.clone(), summary.clone());
    }
}
