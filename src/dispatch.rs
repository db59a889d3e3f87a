//! Event router: the single-threaded dispatch loop.
//!
//! Drains the shared raw-event queue, routes each event to its type
//! handler, updates statistics and the activity log, and hands successful
//! screenshots to the analysis throttle. One bad event never stops the
//! loop.

use crate::activity::ActivityLog;
use crate::analysis::throttle::{AnalysisQueue, SubmitOutcome};
use crate::producer::types::{AnalysisRequest, KeyActionKind, RawEvent};
use crate::producer::join_bounded;
use crate::stats::MonitorStats;
use crossbeam_channel::Receiver;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Owns the dispatch thread. States: stopped, running, stopped (terminal);
/// a fresh instance is required to run again after `stop()`.
pub struct Dispatcher {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn spawn(
        receiver: Receiver<RawEvent>,
        analysis_queue: Arc<AnalysisQueue>,
        stats: Arc<MonitorStats>,
        activity: Arc<ActivityLog>,
        poll: Duration,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                // Drain everything currently queued, then yield.
                while let Ok(event) = receiver.try_recv() {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        handle_event(&event, &analysis_queue, &stats, &activity);
                    }));
                    if outcome.is_err() {
                        tracing::error!(kind = event.kind(), "event handler panicked; continuing");
                    }
                }
                thread::sleep(poll);
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the loop to exit and join within `timeout`.
    pub fn stop(&mut self, timeout: Duration) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            join_bounded(handle, timeout, "dispatcher");
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop(Duration::from_secs(2));
    }
}

fn handle_event(
    event: &RawEvent,
    analysis_queue: &AnalysisQueue,
    stats: &MonitorStats,
    activity: &ActivityLog,
) {
    match event {
        RawEvent::WindowChange(change) => {
            stats.record_window_change();
            activity.record_window_change(change);
            activity.record_action(
                "window_change",
                format!("{}: {}", change.app_name, change.window_title),
            );
        }
        RawEvent::KeyAction(action) => {
            stats.record_key_action();
            activity.count_session_event();
            activity.record_action("key_action", key_action_label(action.action));
        }
        RawEvent::ScreenshotCaptured(shot) => {
            stats.record_screenshot();
            activity.count_session_event();
            if shot.success {
                activity.record_action("screenshot", "captured");
                let request = AnalysisRequest {
                    capture: shot.capture.clone(),
                    timestamp: shot.timestamp,
                };
                if analysis_queue.submit(request) == SubmitOutcome::Throttled {
                    stats.record_analysis_throttled();
                }
            } else {
                activity.record_action("screenshot", "capture failed");
            }
        }
    }
}

fn key_action_label(kind: KeyActionKind) -> &'static str {
    match kind {
        KeyActionKind::Typing => "typing",
        KeyActionKind::Shortcut => "shortcut",
        KeyActionKind::Navigation => "navigation",
        KeyActionKind::Editing => "editing",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::types::{KeyActionEvent, ScreenshotEvent, WindowChangeEvent};
    use crate::source::CaptureRef;
    use crossbeam_channel::bounded;

    fn pipeline() -> (Arc<AnalysisQueue>, Arc<MonitorStats>, Arc<ActivityLog>) {
        (
            Arc::new(AnalysisQueue::new(Duration::ZERO, 4)),
            Arc::new(MonitorStats::new()),
            Arc::new(ActivityLog::new(64)),
        )
    }

    #[test]
    fn test_events_update_stats_and_activity() {
        let (queue, stats, activity) = pipeline();
        let (sender, receiver) = bounded(64);

        sender
            .send(RawEvent::WindowChange(WindowChangeEvent::new(
                "excel",
                "Budget.xlsx",
            )))
            .unwrap();
        sender
            .send(RawEvent::KeyAction(KeyActionEvent::new(
                KeyActionKind::Typing,
            )))
            .unwrap();
        sender
            .send(RawEvent::ScreenshotCaptured(ScreenshotEvent::new(
                CaptureRef::from_bytes(vec![0u8; 4]),
                true,
            )))
            .unwrap();

        let mut dispatcher = Dispatcher::spawn(
            receiver,
            queue.clone(),
            stats.clone(),
            activity.clone(),
            Duration::from_millis(5),
        );

        // Give the loop a few cycles to drain.
        thread::sleep(Duration::from_millis(100));
        dispatcher.stop(Duration::from_secs(1));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.window_changes, 1);
        assert_eq!(snapshot.key_actions, 1);
        assert_eq!(snapshot.screenshots_taken, 1);
        assert_eq!(queue.pending(), 1);
        assert_eq!(activity.recent_actions(10).len(), 3);
    }

    #[test]
    fn test_failed_screenshot_not_submitted() {
        let (queue, stats, activity) = pipeline();
        handle_event(
            &RawEvent::ScreenshotCaptured(ScreenshotEvent::new(
                CaptureRef::from_bytes(Vec::new()),
                false,
            )),
            &queue,
            &stats,
            &activity,
        );

        assert_eq!(queue.pending(), 0);
        assert_eq!(stats.snapshot().screenshots_taken, 1);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_loop() {
        let (queue, stats, activity) = pipeline();
        // Every record_action call from here on panics inside the handler.
        activity.poison_action_lock();

        let (sender, receiver) = bounded(64);
        sender
            .send(RawEvent::WindowChange(WindowChangeEvent::new("excel", "a")))
            .unwrap();
        sender
            .send(RawEvent::WindowChange(WindowChangeEvent::new("word", "b")))
            .unwrap();

        let mut dispatcher = Dispatcher::spawn(
            receiver,
            queue,
            stats.clone(),
            activity,
            Duration::from_millis(5),
        );
        thread::sleep(Duration::from_millis(100));
        assert!(dispatcher.is_running());
        dispatcher.stop(Duration::from_secs(1));

        // The second event was still routed after the first handler panicked.
        assert_eq!(stats.snapshot().window_changes, 2);
    }

    #[test]
    fn test_throttled_submission_counted() {
        let (_, stats, activity) = pipeline();
        let queue = Arc::new(AnalysisQueue::new(Duration::from_secs(60), 4));

        for _ in 0..2 {
            handle_event(
                &RawEvent::ScreenshotCaptured(ScreenshotEvent::new(
                    CaptureRef::from_bytes(vec![0u8; 4]),
                    true,
                )),
                &queue,
                &stats,
                &activity,
            );
        }

        assert_eq!(queue.pending(), 1);
        assert_eq!(stats.snapshot().analyses_throttled, 1);
    }
}
