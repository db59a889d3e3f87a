//! Boundary contracts for the OS-level collaborators.
//!
//! Window/keyboard hooking and screen capture are platform concerns that
//! live outside this crate. Producers consume them through the traits
//! defined here; noop implementations let the agent run on any platform
//! (without emitting anything), and simulated implementations drive the
//! demo and the integration tests.

use crate::producer::types::{KeyActionEvent, KeyActionKind, WindowChangeEvent};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Errors raised by an external event source.
#[derive(Debug)]
pub enum SourceError {
    /// The underlying device or OS facility is missing
    Unavailable(String),
    /// The OS denied access to the facility
    PermissionDenied(String),
    /// The source failed mid-operation
    Failed(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(s) => write!(f, "source unavailable: {s}"),
            SourceError::PermissionDenied(s) => write!(f, "permission denied: {s}"),
            SourceError::Failed(s) => write!(f, "source failure: {s}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// An opaque reference to a captured image plus capture metadata.
///
/// The image bytes are shared rather than copied so a capture can sit in
/// the analysis queue without duplicating buffers.
#[derive(Debug, Clone)]
pub struct CaptureRef {
    /// Raw image bytes (format is the capture implementation's concern)
    pub image: Arc<Vec<u8>>,
    /// Application hint from the capture layer, if known
    pub app_hint: Option<String>,
    /// When the capture was taken
    pub captured_at: DateTime<Utc>,
}

impl CaptureRef {
    pub fn from_bytes(image: Vec<u8>) -> Self {
        Self {
            image: Arc::new(image),
            app_hint: None,
            captured_at: Utc::now(),
        }
    }

    pub fn with_app_hint(mut self, hint: impl Into<String>) -> Self {
        self.app_hint = Some(hint.into());
        self
    }
}

/// Source of active-window change notifications.
///
/// `next_change` blocks for at most `timeout` and returns `Ok(None)` when
/// nothing happened in that span, so a polling producer can observe its
/// running flag between calls.
pub trait WindowHook: Send {
    fn start(&mut self) -> Result<(), SourceError>;
    fn next_change(&mut self, timeout: Duration) -> Result<Option<WindowChangeEvent>, SourceError>;
}

/// Source of keyboard action notifications. Same polling contract as
/// [`WindowHook`].
pub trait KeyboardHook: Send {
    fn start(&mut self) -> Result<(), SourceError>;
    fn next_key(&mut self, timeout: Duration) -> Result<Option<KeyActionEvent>, SourceError>;
}

/// Captures an image of the currently active window.
pub trait ScreenCapture: Send {
    fn capture_active_window(&mut self) -> Result<CaptureRef, SourceError>;
}

// ---------------------------------------------------------------------------
// Noop implementations
// ---------------------------------------------------------------------------

/// A window hook that never reports a change.
#[derive(Debug, Default)]
pub struct NoopWindowHook;

impl WindowHook for NoopWindowHook {
    fn start(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    fn next_change(&mut self, timeout: Duration) -> Result<Option<WindowChangeEvent>, SourceError> {
        std::thread::sleep(timeout);
        Ok(None)
    }
}

/// A keyboard hook that never reports a key action.
#[derive(Debug, Default)]
pub struct NoopKeyboardHook;

impl KeyboardHook for NoopKeyboardHook {
    fn start(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    fn next_key(&mut self, timeout: Duration) -> Result<Option<KeyActionEvent>, SourceError> {
        std::thread::sleep(timeout);
        Ok(None)
    }
}

/// A screen capture that always fails as unavailable.
///
/// Using this disables the screenshot producer at startup while leaving
/// the rest of the pipeline running.
#[derive(Debug, Default)]
pub struct NoopScreenCapture;

impl ScreenCapture for NoopScreenCapture {
    fn capture_active_window(&mut self) -> Result<CaptureRef, SourceError> {
        Err(SourceError::Unavailable(
            "no screen capture backend on this platform".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Simulated implementations
// ---------------------------------------------------------------------------

/// A window hook that replays a scripted rotation of applications.
pub struct SimulatedWindowHook {
    script: Vec<(String, String)>,
    position: usize,
    interval: Duration,
    elapsed: Duration,
}

impl SimulatedWindowHook {
    /// Rotate through `script` entries of (app_name, window_title), one
    /// change per `interval`.
    pub fn new(script: Vec<(String, String)>, interval: Duration) -> Self {
        Self {
            script,
            position: 0,
            interval,
            elapsed: interval, // first poll reports a change immediately
        }
    }

    /// A plausible office-work rotation for demos.
    pub fn office_rotation(interval: Duration) -> Self {
        Self::new(
            vec![
                ("excel".to_string(), "Quarterly Budget.xlsx".to_string()),
                ("browser".to_string(), "Expense Policy - docs".to_string()),
                ("word".to_string(), "Summary Report.docx".to_string()),
                ("mail".to_string(), "Inbox".to_string()),
            ],
            interval,
        )
    }
}

impl WindowHook for SimulatedWindowHook {
    fn start(&mut self) -> Result<(), SourceError> {
        if self.script.is_empty() {
            return Err(SourceError::Unavailable("empty window script".to_string()));
        }
        Ok(())
    }

    fn next_change(&mut self, timeout: Duration) -> Result<Option<WindowChangeEvent>, SourceError> {
        std::thread::sleep(timeout);
        self.elapsed += timeout;
        if self.elapsed < self.interval {
            return Ok(None);
        }
        self.elapsed = Duration::ZERO;

        let (app, title) = &self.script[self.position % self.script.len()];
        self.position += 1;
        Ok(Some(WindowChangeEvent::new(app.clone(), title.clone())))
    }
}

/// A keyboard hook that emits a repeating pattern of key actions.
pub struct SimulatedKeyboardHook {
    pattern: Vec<KeyActionKind>,
    position: usize,
    interval: Duration,
    elapsed: Duration,
}

impl SimulatedKeyboardHook {
    pub fn new(pattern: Vec<KeyActionKind>, interval: Duration) -> Self {
        Self {
            pattern,
            position: 0,
            interval,
            elapsed: Duration::ZERO,
        }
    }

    /// Mostly typing with occasional shortcuts and corrections.
    pub fn typing_pattern(interval: Duration) -> Self {
        Self::new(
            vec![
                KeyActionKind::Typing,
                KeyActionKind::Typing,
                KeyActionKind::Typing,
                KeyActionKind::Editing,
                KeyActionKind::Typing,
                KeyActionKind::Shortcut,
                KeyActionKind::Navigation,
            ],
            interval,
        )
    }
}

impl KeyboardHook for SimulatedKeyboardHook {
    fn start(&mut self) -> Result<(), SourceError> {
        if self.pattern.is_empty() {
            return Err(SourceError::Unavailable("empty key pattern".to_string()));
        }
        Ok(())
    }

    fn next_key(&mut self, timeout: Duration) -> Result<Option<KeyActionEvent>, SourceError> {
        std::thread::sleep(timeout);
        self.elapsed += timeout;
        if self.elapsed < self.interval {
            return Ok(None);
        }
        self.elapsed = Duration::ZERO;

        let action = self.pattern[self.position % self.pattern.len()];
        self.position += 1;
        Ok(Some(KeyActionEvent::new(action)))
    }
}

/// A screen capture that returns a fixed placeholder image.
pub struct SimulatedScreenCapture {
    app_hint: Option<String>,
}

impl SimulatedScreenCapture {
    pub fn new() -> Self {
        Self { app_hint: None }
    }

    pub fn with_app_hint(hint: impl Into<String>) -> Self {
        Self {
            app_hint: Some(hint.into()),
        }
    }
}

impl Default for SimulatedScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenCapture for SimulatedScreenCapture {
    fn capture_active_window(&mut self) -> Result<CaptureRef, SourceError> {
        let mut capture = CaptureRef::from_bytes(vec![0u8; 16]);
        if let Some(ref hint) = self.app_hint {
            capture = capture.with_app_hint(hint.clone());
        }
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_window_hook_rotates() {
        let mut hook = SimulatedWindowHook::new(
            vec![
                ("a".to_string(), "one".to_string()),
                ("b".to_string(), "two".to_string()),
            ],
            Duration::from_millis(1),
        );
        hook.start().unwrap();

        let first = hook.next_change(Duration::from_millis(1)).unwrap().unwrap();
        let second = hook.next_change(Duration::from_millis(1)).unwrap().unwrap();
        assert_eq!(first.app_name, "a");
        assert_eq!(second.app_name, "b");
    }

    #[test]
    fn test_empty_script_is_unavailable() {
        let mut hook = SimulatedWindowHook::new(Vec::new(), Duration::from_millis(1));
        assert!(matches!(hook.start(), Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_noop_capture_fails() {
        let mut capture = NoopScreenCapture;
        assert!(capture.capture_active_window().is_err());
    }

    #[test]
    fn test_simulated_capture_carries_hint() {
        let mut capture = SimulatedScreenCapture::with_app_hint("excel");
        let shot = capture.capture_active_window().unwrap();
        assert_eq!(shot.app_hint.as_deref(), Some("excel"));
    }
}
