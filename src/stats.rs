//! Process-wide pipeline statistics.
//!
//! Counters are atomic so the dispatcher and analysis worker can bump them
//! without locking; readers always take a copy-on-read snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for the monitoring session.
#[derive(Debug)]
pub struct MonitorStats {
    total_events: AtomicU64,
    window_changes: AtomicU64,
    key_actions: AtomicU64,
    screenshots_taken: AtomicU64,
    ocr_analyses: AtomicU64,
    analyses_throttled: AtomicU64,
    events_dropped: AtomicU64,
    start_time: DateTime<Utc>,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            total_events: AtomicU64::new(0),
            window_changes: AtomicU64::new(0),
            key_actions: AtomicU64::new(0),
            screenshots_taken: AtomicU64::new(0),
            ocr_analyses: AtomicU64::new(0),
            analyses_throttled: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            start_time: Utc::now(),
        }
    }

    pub fn record_window_change(&self) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        self.window_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_key_action(&self) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        self.key_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_screenshot(&self) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        self.screenshots_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ocr_analysis(&self) {
        self.ocr_analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis_throttled(&self) {
        self.analyses_throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy-on-read snapshot with derived runtime.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_events: self.total_events.load(Ordering::Relaxed),
            window_changes: self.window_changes.load(Ordering::Relaxed),
            key_actions: self.key_actions.load(Ordering::Relaxed),
            screenshots_taken: self.screenshots_taken.load(Ordering::Relaxed),
            ocr_analyses: self.ocr_analyses.load(Ordering::Relaxed),
            analyses_throttled: self.analyses_throttled.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            start_time: self.start_time,
            runtime_secs: (Utc::now() - self.start_time).num_seconds().max(0) as u64,
        }
    }

    /// Display string for status output.
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Total events: {}\n\
             - Window changes: {}\n\
             - Key actions: {}\n\
             - Screenshots taken: {}\n\
             - Screen analyses: {}\n\
             - Analyses throttled: {}\n\
             - Runtime: {} seconds",
            s.total_events,
            s.window_changes,
            s.key_actions,
            s.screenshots_taken,
            s.ocr_analyses,
            s.analyses_throttled,
            s.runtime_secs
        )
    }

    pub fn reset(&self) {
        self.total_events.store(0, Ordering::Relaxed);
        self.window_changes.store(0, Ordering::Relaxed);
        self.key_actions.store(0, Ordering::Relaxed);
        self.screenshots_taken.store(0, Ordering::Relaxed);
        self.ocr_analyses.store(0, Ordering::Relaxed);
        self.analyses_throttled.store(0, Ordering::Relaxed);
        self.events_dropped.store(0, Ordering::Relaxed);
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable view of the counters at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_events: u64,
    pub window_changes: u64,
    pub key_actions: u64,
    pub screenshots_taken: u64,
    pub ocr_analyses: u64,
    pub analyses_throttled: u64,
    pub events_dropped: u64,
    pub start_time: DateTime<Utc>,
    pub runtime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = MonitorStats::new();

        stats.record_window_change();
        stats.record_key_action();
        stats.record_key_action();
        stats.record_screenshot();
        stats.record_ocr_analysis();

        let s = stats.snapshot();
        assert_eq!(s.total_events, 4);
        assert_eq!(s.window_changes, 1);
        assert_eq!(s.key_actions, 2);
        assert_eq!(s.screenshots_taken, 1);
        assert_eq!(s.ocr_analyses, 1);
    }

    #[test]
    fn test_reset_clears_counters() {
        let stats = MonitorStats::new();
        stats.record_window_change();
        stats.record_analysis_throttled();
        stats.reset();

        let s = stats.snapshot();
        assert_eq!(s.total_events, 0);
        assert_eq!(s.analyses_throttled, 0);
    }

    #[test]
    fn test_summary_format() {
        let stats = MonitorStats::new();
        stats.record_screenshot();
        let summary = stats.summary();

        assert!(summary.contains("Total events: 1"));
        assert!(summary.contains("Screenshots taken: 1"));
    }
}
