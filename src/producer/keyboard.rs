//! Keyboard action producer.

use crate::producer::types::RawEvent;
use crate::producer::{join_bounded, push_event};
use crate::source::{KeyboardHook, SourceError};
use crate::stats::MonitorStats;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Watches the keyboard hook and emits [`RawEvent::KeyAction`].
pub struct KeyWatcher {
    hook: Option<Box<dyn KeyboardHook>>,
    sender: Sender<RawEvent>,
    stats: Arc<MonitorStats>,
    poll: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyWatcher {
    pub fn new(
        hook: Box<dyn KeyboardHook>,
        sender: Sender<RawEvent>,
        stats: Arc<MonitorStats>,
        poll: Duration,
    ) -> Self {
        Self {
            hook: Some(hook),
            sender,
            stats,
            poll,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::Failed(
                "key watcher already running".to_string(),
            ));
        }
        let mut hook = self.hook.take().ok_or_else(|| {
            SourceError::Unavailable("keyboard hook already consumed".to_string())
        })?;
        hook.start()?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let sender = self.sender.clone();
        let stats = self.stats.clone();
        let poll = self.poll;

        let handle = thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                match hook.next_key(poll) {
                    Ok(Some(event)) => {
                        push_event(&sender, &stats, RawEvent::KeyAction(event));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "keyboard hook failed; disabling watcher");
                        break;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        self.handle = Some(handle);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self, timeout: Duration) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            join_bounded(handle, timeout, "key watcher");
        }
    }
}

impl Drop for KeyWatcher {
    fn drop(&mut self) {
        self.stop(Duration::from_secs(2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::types::KeyActionKind;
    use crate::source::SimulatedKeyboardHook;
    use crossbeam_channel::bounded;

    #[test]
    fn test_watcher_emits_key_actions_in_order() {
        let (sender, receiver) = bounded(64);
        let hook = SimulatedKeyboardHook::new(
            vec![KeyActionKind::Typing, KeyActionKind::Shortcut],
            Duration::from_millis(5),
        );
        let mut watcher = KeyWatcher::new(
            Box::new(hook),
            sender,
            Arc::new(MonitorStats::new()),
            Duration::from_millis(5),
        );

        watcher.start().unwrap();
        let first = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
        let second = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
        watcher.stop(Duration::from_secs(1));

        // FIFO per producer
        match (first, second) {
            (RawEvent::KeyAction(a), RawEvent::KeyAction(b)) => {
                assert_eq!(a.action, KeyActionKind::Typing);
                assert_eq!(b.action, KeyActionKind::Shortcut);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }
}
