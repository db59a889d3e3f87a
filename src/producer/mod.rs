//! Event producers: one thread per external source.
//!
//! Producers push immutable [`RawEvent`]s into the shared queue and never
//! call downstream components. A producer that cannot initialize its source
//! disables itself without affecting the others; `stop()` always returns
//! within the bounded join timeout.

pub mod keyboard;
pub mod screenshot;
pub mod types;
pub mod window;

pub use keyboard::KeyWatcher;
pub use screenshot::ScreenshotTimer;
pub use types::{
    AnalysisRequest, KeyActionEvent, KeyActionKind, RawEvent, ScreenshotEvent, WindowChangeEvent,
};
pub use window::WindowWatcher;

use crate::stats::MonitorStats;
use crossbeam_channel::{Sender, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Join a worker thread, giving up after `timeout`.
///
/// Returns false (after logging) when the thread did not exit in time;
/// shutdown proceeds regardless.
pub(crate) fn join_bounded(handle: JoinHandle<()>, timeout: Duration, name: &str) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            tracing::warn!(thread = name, "thread did not exit within join timeout");
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    let _ = handle.join();
    true
}

/// Push an event without blocking; a full queue drops it, counted and
/// logged.
pub(crate) fn push_event(sender: &Sender<RawEvent>, stats: &MonitorStats, event: RawEvent) {
    match sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            stats.record_event_dropped();
            tracing::warn!(kind = event.kind(), "event queue full; dropping event");
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::debug!("event queue disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::types::{KeyActionEvent, KeyActionKind};
    use crossbeam_channel::bounded;

    #[test]
    fn test_full_queue_drop_is_counted() {
        let stats = MonitorStats::new();
        let (sender, _receiver) = bounded(1);

        let event = || RawEvent::KeyAction(KeyActionEvent::new(KeyActionKind::Typing));
        push_event(&sender, &stats, event());
        push_event(&sender, &stats, event());

        assert_eq!(stats.snapshot().events_dropped, 1);
    }

    #[test]
    fn test_successful_push_not_counted_as_drop() {
        let stats = MonitorStats::new();
        let (sender, _receiver) = bounded(4);

        push_event(
            &sender,
            &stats,
            RawEvent::KeyAction(KeyActionEvent::new(KeyActionKind::Typing)),
        );
        assert_eq!(stats.snapshot().events_dropped, 0);
    }
}
