//! Recent-activity log and workflow session tracking.
//!
//! The dispatcher records one action per event into a capped ring buffer,
//! and segments workflow sessions at window changes: a session covers one
//! stretch of focus on a single application.

use crate::producer::types::WindowChangeEvent;
use crate::stats::StatsSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Maximum number of closed sessions retained in memory.
const MAX_SESSIONS: usize = 500;

/// One raw-activity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub timestamp: DateTime<Utc>,
    /// Event kind label ("window_change", "key_action", "screenshot")
    pub kind: String,
    /// Short human-readable detail
    pub detail: String,
}

/// A stretch of focus on one application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSession {
    pub id: Uuid,
    pub app_name: String,
    pub window_title: String,
    pub started_at: DateTime<Utc>,
    /// None while the session is still open
    pub ended_at: Option<DateTime<Utc>>,
    /// Raw events observed during the session
    pub event_count: u64,
}

/// Everything written by [`ActivityLog::export`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedLogs {
    pub device: String,
    pub exported_at: DateTime<Utc>,
    pub statistics: StatsSnapshot,
    pub recent_actions: Vec<ActionRecord>,
    pub sessions: Vec<WorkflowSession>,
}

/// In-memory activity log shared between the dispatcher and query callers.
pub struct ActivityLog {
    recent: Mutex<VecDeque<ActionRecord>>,
    sessions: Mutex<Vec<WorkflowSession>>,
    current_session: Mutex<Option<WorkflowSession>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            sessions: Mutex::new(Vec::new()),
            current_session: Mutex::new(None),
            capacity,
        }
    }

    /// Record one action, evicting the oldest when the buffer is full.
    pub fn record_action(&self, kind: &str, detail: impl Into<String>) {
        let mut recent = self.recent.lock().expect("activity ring lock poisoned");
        if recent.len() >= self.capacity {
            recent.pop_front();
        }
        recent.push_back(ActionRecord {
            timestamp: Utc::now(),
            kind: kind.to_string(),
            detail: detail.into(),
        });
    }

    /// Handle a window change: close the open session, start a new one.
    pub fn record_window_change(&self, event: &WindowChangeEvent) {
        let mut current = self
            .current_session
            .lock()
            .expect("current session lock poisoned");

        if let Some(mut session) = current.take() {
            session.ended_at = Some(event.timestamp);
            let mut sessions = self.sessions.lock().expect("session list lock poisoned");
            if sessions.len() >= MAX_SESSIONS {
                sessions.remove(0);
            }
            sessions.push(session);
        }

        *current = Some(WorkflowSession {
            id: Uuid::new_v4(),
            app_name: event.app_name.clone(),
            window_title: event.window_title.clone(),
            started_at: event.timestamp,
            ended_at: None,
            event_count: 1,
        });
    }

    /// Count a raw event into the open session, if there is one.
    pub fn count_session_event(&self) {
        if let Some(ref mut session) = *self
            .current_session
            .lock()
            .expect("current session lock poisoned")
        {
            session.event_count += 1;
        }
    }

    /// Close the open session (on shutdown).
    pub fn close_current_session(&self) {
        let mut current = self
            .current_session
            .lock()
            .expect("current session lock poisoned");
        if let Some(mut session) = current.take() {
            session.ended_at = Some(Utc::now());
            self.sessions
                .lock()
                .expect("session list lock poisoned")
                .push(session);
        }
    }

    /// Most recent actions, newest first.
    pub fn recent_actions(&self, limit: usize) -> Vec<ActionRecord> {
        let recent = self.recent.lock().expect("activity ring lock poisoned");
        recent.iter().rev().take(limit).cloned().collect()
    }

    /// Workflow sessions, newest first; includes the open session.
    pub fn workflow_sessions(&self, limit: usize) -> Vec<WorkflowSession> {
        let mut out = Vec::new();
        if let Some(ref session) = *self
            .current_session
            .lock()
            .expect("current session lock poisoned")
        {
            out.push(session.clone());
        }
        let sessions = self.sessions.lock().expect("session list lock poisoned");
        out.extend(sessions.iter().rev().take(limit).cloned());
        out.truncate(limit);
        out
    }

    /// Export the log as pretty JSON, returning the written path.
    ///
    /// Without an explicit path, a timestamped file is created under
    /// `default_dir`.
    pub fn export(
        &self,
        path: Option<PathBuf>,
        statistics: StatsSnapshot,
        default_dir: &Path,
    ) -> Result<PathBuf, std::io::Error> {
        let path = path.unwrap_or_else(|| {
            default_dir.join(format!(
                "activity_{}.json",
                Utc::now().format("%Y%m%d_%H%M%S")
            ))
        });

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let document = ExportedLogs {
            device: hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string()),
            exported_at: Utc::now(),
            statistics,
            recent_actions: self.recent_actions(self.capacity),
            sessions: self.workflow_sessions(MAX_SESSIONS),
        };

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Poison the action-ring lock so later `record_action` calls panic.
    #[cfg(test)]
    pub(crate) fn poison_action_lock(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.recent.lock().unwrap();
            panic!("poisoning activity ring");
        }));
    }

    /// Drop all recorded actions and sessions.
    pub fn clear(&self) {
        self.recent
            .lock()
            .expect("activity ring lock poisoned")
            .clear();
        self.sessions
            .lock()
            .expect("session list lock poisoned")
            .clear();
        *self
            .current_session
            .lock()
            .expect("current session lock poisoned") = None;
    }
}
