//! Periodic screenshot producer.

use crate::producer::types::{RawEvent, ScreenshotEvent};
use crate::producer::{join_bounded, push_event};
use crate::source::{CaptureRef, ScreenCapture, SourceError};
use crate::stats::MonitorStats;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Captures the active window on a fixed cadence and emits
/// [`RawEvent::ScreenshotCaptured`].
///
/// Rate limiting of the actual analysis happens downstream in the throttle;
/// this producer only controls how often captures are attempted.
pub struct ScreenshotTimer {
    capture: Option<Box<dyn ScreenCapture>>,
    sender: Sender<RawEvent>,
    stats: Arc<MonitorStats>,
    cadence: Duration,
    poll: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScreenshotTimer {
    pub fn new(
        capture: Box<dyn ScreenCapture>,
        sender: Sender<RawEvent>,
        stats: Arc<MonitorStats>,
        cadence: Duration,
        poll: Duration,
    ) -> Self {
        Self {
            capture: Some(capture),
            sender,
            stats,
            cadence,
            poll,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start the capture loop.
    ///
    /// A probe capture runs first so an unavailable backend disables this
    /// producer at startup instead of failing silently forever.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::Failed(
                "screenshot timer already running".to_string(),
            ));
        }
        let mut capture = self.capture.take().ok_or_else(|| {
            SourceError::Unavailable("screen capture already consumed".to_string())
        })?;
        capture.capture_active_window()?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let sender = self.sender.clone();
        let stats = self.stats.clone();
        let cadence = self.cadence;
        let poll = self.poll;

        let handle = thread::spawn(move || {
            let mut last_capture = Instant::now();
            while running.load(Ordering::SeqCst) {
                thread::sleep(poll);
                if last_capture.elapsed() < cadence {
                    continue;
                }
                last_capture = Instant::now();

                match capture.capture_active_window() {
                    Ok(image) => {
                        push_event(
                            &sender,
                            &stats,
                            RawEvent::ScreenshotCaptured(ScreenshotEvent::new(image, true)),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "screen capture failed");
                        push_event(
                            &sender,
                            &stats,
                            RawEvent::ScreenshotCaptured(ScreenshotEvent::new(
                                CaptureRef::from_bytes(Vec::new()),
                                false,
                            )),
                        );
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
            join_bounded(handle, timeout, "screenshot timer");
        }
    }
}

impl Drop for ScreenshotTimer {
    fn drop(&mut self) {
        self.stop(Duration::from_secs(2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NoopScreenCapture, SimulatedScreenCapture};
    use crossbeam_channel::bounded;

    #[test]
    fn test_timer_captures_on_cadence() {
        let (sender, receiver) = bounded(64);
        let mut timer = ScreenshotTimer::new(
            Box::new(SimulatedScreenCapture::new()),
            sender,
            Arc::new(MonitorStats::new()),
            Duration::from_millis(10),
            Duration::from_millis(5),
        );

        timer.start().unwrap();
        let event = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
        timer.stop(Duration::from_secs(1));

        match event {
            RawEvent::ScreenshotCaptured(shot) => assert!(shot.success),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unavailable_backend_disables_timer() {
        let (sender, _receiver) = bounded(64);
        let mut timer = ScreenshotTimer::new(
            Box::new(NoopScreenCapture),
            sender,
            Arc::new(MonitorStats::new()),
            Duration::from_millis(10),
            Duration::from_millis(5),
        );

        assert!(timer.start().is_err());
        assert!(!timer.is_running());
    }
}
