//! Active-window change producer.

use crate::producer::types::RawEvent;
use crate::producer::{join_bounded, push_event};
use crate::source::{SourceError, WindowHook};
use crate::stats::MonitorStats;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Watches the window hook and emits [`RawEvent::WindowChange`].
pub struct WindowWatcher {
    hook: Option<Box<dyn WindowHook>>,
    sender: Sender<RawEvent>,
    stats: Arc<MonitorStats>,
    poll: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WindowWatcher {
    pub fn new(
        hook: Box<dyn WindowHook>,
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

    /// Start the watcher thread.
    ///
    /// Fails (leaving the producer disabled) if the hook cannot initialize
    /// or the watcher is already running.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::Failed(
                "window watcher already running".to_string(),
            ));
        }
        let mut hook = self
            .hook
            .take()
            .ok_or_else(|| SourceError::Unavailable("window hook already consumed".to_string()))?;
        hook.start()?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let sender = self.sender.clone();
        let stats = self.stats.clone();
        let poll = self.poll;

        let handle = thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                match hook.next_change(poll) {
                    Ok(Some(event)) => {
                        push_event(&sender, &stats, RawEvent::WindowChange(event));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "window hook failed; disabling watcher");
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

    /// Signal the loop to exit and join within `timeout`.
    pub fn stop(&mut self, timeout: Duration) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            join_bounded(handle, timeout, "window watcher");
        }
    }
}

impl Drop for WindowWatcher {
    fn drop(&mut self) {
        self.stop(Duration::from_secs(2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SimulatedWindowHook;
    use crossbeam_channel::bounded;

    fn stats() -> Arc<MonitorStats> {
        Arc::new(MonitorStats::new())
    }

    #[test]
    fn test_watcher_emits_scripted_changes() {
        let (sender, receiver) = bounded(64);
        let hook = SimulatedWindowHook::new(
            vec![("excel".to_string(), "Sheet1".to_string())],
            Duration::from_millis(5),
        );
        let mut watcher =
            WindowWatcher::new(Box::new(hook), sender, stats(), Duration::from_millis(5));

        watcher.start().unwrap();
        let event = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
        watcher.stop(Duration::from_secs(1));

        match event {
            RawEvent::WindowChange(change) => assert_eq!(change.app_name, "excel"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_failed_source_disables_watcher_only() {
        let (sender, _receiver) = bounded(64);
        let hook = SimulatedWindowHook::new(Vec::new(), Duration::from_millis(5));
        let mut watcher =
            WindowWatcher::new(Box::new(hook), sender, stats(), Duration::from_millis(5));

        assert!(watcher.start().is_err());
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_double_start_rejected() {
        let (sender, _receiver) = bounded(64);
        let hook = SimulatedWindowHook::new(
            vec![("a".to_string(), "b".to_string())],
            Duration::from_millis(50),
        );
        let mut watcher =
            WindowWatcher::new(Box::new(hook), sender, stats(), Duration::from_millis(5));

        watcher.start().unwrap();
        assert!(watcher.start().is_err());
        watcher.stop(Duration::from_secs(1));
    }
}
