//! Decaying live state of detected tasks and applications.
//!
//! Two independent collections keyed by name. Tasks merge only within a
//! short window of the entry's first sighting (bursty evidence must not
//! inflate a count forever) and decay quickly; applications always merge
//! by name (they persist across a session) and decay on a longer window.
//! This asymmetry is intentional.

use crate::analysis::analyzer::AnalysisResult;
use crate::classify::{AppMatch, TaskMatch};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

/// Placeholder returned by [`ActivityAggregator::summary`] when nothing is
/// currently detected.
pub const EMPTY_SUMMARY: &str = "No recent activity detected";

/// A task category currently believed active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedTask {
    pub name: String,
    /// Confidence in [0, 1]; only ever raised within a merge window
    pub confidence: f64,
    /// Keywords observed as evidence, de-duplicated
    pub evidence: Vec<String>,
    /// First sighting in the current merge window
    pub first_seen: DateTime<Utc>,
    /// Observations merged into this entry
    pub count: u32,
}

/// An application currently believed active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedApplication {
    pub name: String,
    pub confidence: f64,
    pub context: BTreeMap<String, String>,
    /// Refreshed on every observation
    pub last_seen: DateTime<Utc>,
    pub count: u32,
}

/// Rolling, time-windowed state of current tasks and applications.
///
/// Each collection sits behind its own mutex; read accessors return
/// defensive copies so callers never observe a collection mid-eviction.
pub struct ActivityAggregator {
    tasks: Mutex<HashMap<String, DetectedTask>>,
    applications: Mutex<HashMap<String, DetectedApplication>>,
    task_merge_window: ChronoDuration,
    task_retention: ChronoDuration,
    app_retention: ChronoDuration,
}

impl ActivityAggregator {
    pub fn new(
        task_merge_window: Duration,
        task_retention: Duration,
        app_retention: Duration,
    ) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            applications: Mutex::new(HashMap::new()),
            task_merge_window: to_chrono(task_merge_window),
            task_retention: to_chrono(task_retention),
            app_retention: to_chrono(app_retention),
        }
    }

    /// Defaults per the aggregation contract: 10 s task merge window,
    /// 30 s task retention, 60 s application retention.
    pub fn with_defaults() -> Self {
        Self::new(
            Duration::from_secs(10),
            Duration::from_secs(30),
            Duration::from_secs(60),
        )
    }

    /// Feed one analysis result into both collections.
    pub fn observe_analysis(&self, result: &AnalysisResult) {
        let now = Utc::now();
        for task in &result.tasks {
            self.observe_task_at(task, now);
        }
        for application in &result.applications {
            self.observe_application_at(application, now);
        }
    }

    pub fn observe_task(&self, incoming: &TaskMatch) {
        self.observe_task_at(incoming, Utc::now());
    }

    /// Observe a task match at an explicit instant.
    ///
    /// Merge-or-insert is the only mutation path: within the merge window
    /// the entry keeps its `first_seen`, takes the max confidence, and
    /// increments its count; outside it the entry is replaced wholesale.
    /// Stale entries are purged on every call.
    pub fn observe_task_at(&self, incoming: &TaskMatch, now: DateTime<Utc>) {
        let mut tasks = self.tasks.lock().expect("task collection lock poisoned");
        tasks.retain(|_, t| now - t.first_seen <= self.task_retention);

        if let Some(existing) = tasks.get_mut(&incoming.name) {
            if now - existing.first_seen <= self.task_merge_window {
                existing.confidence = existing.confidence.max(incoming.confidence);
                existing.count += 1;
                for word in &incoming.evidence {
                    if !existing.evidence.contains(word) {
                        existing.evidence.push(word.clone());
                    }
                }
                return;
            }
        }

        tasks.insert(
            incoming.name.clone(),
            DetectedTask {
                name: incoming.name.clone(),
                confidence: incoming.confidence,
                evidence: incoming.evidence.clone(),
                first_seen: now,
                count: 1,
            },
        );
    }

    pub fn observe_application(&self, incoming: &AppMatch) {
        self.observe_application_at(incoming, Utc::now());
    }

    /// Observe an application match at an explicit instant.
    ///
    /// Unlike tasks there is no merge-window gate: a match always merges
    /// into the existing entry for that name, refreshing `last_seen`.
    pub fn observe_application_at(&self, incoming: &AppMatch, now: DateTime<Utc>) {
        let mut apps = self
            .applications
            .lock()
            .expect("application collection lock poisoned");
        apps.retain(|_, a| now - a.last_seen <= self.app_retention);

        match apps.get_mut(&incoming.name) {
            Some(existing) => {
                existing.confidence = existing.confidence.max(incoming.confidence);
                existing.count += 1;
                existing.last_seen = now;
                for (key, value) in &incoming.context {
                    existing.context.insert(key.clone(), value.clone());
                }
            }
            None => {
                apps.insert(
                    incoming.name.clone(),
                    DetectedApplication {
                        name: incoming.name.clone(),
                        confidence: incoming.confidence,
                        context: incoming.context.clone(),
                        last_seen: now,
                        count: 1,
                    },
                );
            }
        }
    }

    /// Snapshot of live tasks, strongest first.
    pub fn tasks_snapshot(&self) -> Vec<DetectedTask> {
        self.tasks_snapshot_at(Utc::now())
    }

    pub fn tasks_snapshot_at(&self, now: DateTime<Utc>) -> Vec<DetectedTask> {
        let tasks = self.tasks.lock().expect("task collection lock poisoned");
        let mut snapshot: Vec<DetectedTask> = tasks
            .values()
            .filter(|t| now - t.first_seen <= self.task_retention)
            .cloned()
            .collect();
        snapshot.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        snapshot
    }

    /// Snapshot of live applications, strongest first.
    pub fn applications_snapshot(&self) -> Vec<DetectedApplication> {
        self.applications_snapshot_at(Utc::now())
    }

    pub fn applications_snapshot_at(&self, now: DateTime<Utc>) -> Vec<DetectedApplication> {
        let apps = self
            .applications
            .lock()
            .expect("application collection lock poisoned");
        let mut snapshot: Vec<DetectedApplication> = apps
            .values()
            .filter(|a| now - a.last_seen <= self.app_retention)
            .cloned()
            .collect();
        snapshot.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        snapshot
    }

    /// Human-readable rendering of the current state.
    pub fn summary(&self) -> String {
        self.summary_at(Utc::now())
    }

    pub fn summary_at(&self, now: DateTime<Utc>) -> String {
        let apps = self.applications_snapshot_at(now);
        let tasks = self.tasks_snapshot_at(now);

        if apps.is_empty() && tasks.is_empty() {
            return EMPTY_SUMMARY.to_string();
        }

        let mut parts = Vec::new();
        if !apps.is_empty() {
            let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
            parts.push(format!("Apps: {}", names.join(", ")));
        }
        if !tasks.is_empty() {
            let entries: Vec<String> = tasks
                .iter()
                .map(|t| format!("{} ({})", t.name, t.count))
                .collect();
            parts.push(format!("Tasks: {}", entries.join(", ")));
        }
        parts.join(" | ")
    }

    /// Drop everything, regardless of age.
    pub fn clear(&self) {
        self.tasks
            .lock()
            .expect("task collection lock poisoned")
            .clear();
        self.applications
            .lock()
            .expect("application collection lock poisoned")
            .clear();
    }
}

fn to_chrono(duration: Duration) -> ChronoDuration {
    ChronoDuration::milliseconds(duration.as_millis() as i64)
}
