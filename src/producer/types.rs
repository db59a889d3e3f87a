//! Raw event types flowing from the producers into the dispatcher.
//!
//! Events are immutable once created: a producer owns an event until it is
//! handed to the shared queue, after which the dispatcher owns it.

use crate::source::CaptureRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An active-window change reported by the window hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowChangeEvent {
    /// Name of the application that gained focus
    pub app_name: String,
    /// Title of the focused window
    pub window_title: String,
    /// Timestamp when the change occurred
    pub timestamp: DateTime<Utc>,
}

impl WindowChangeEvent {
    pub fn new(app_name: impl Into<String>, window_title: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            window_title: window_title.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Broad classification of a keyboard action.
///
/// Key content is reduced to a coarse action kind plus an optional short
/// hint; raw keystrokes are never carried through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyActionKind {
    /// Ordinary text input
    Typing,
    /// A modifier-based shortcut (e.g. copy, paste, save)
    Shortcut,
    /// Cursor or page navigation (arrows, page up/down, tab switching)
    Navigation,
    /// Deletion or correction (backspace, delete, undo)
    Editing,
}

/// A keyboard action reported by the keyboard hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyActionEvent {
    /// Coarse classification of the action
    pub action: KeyActionKind,
    /// Optional classification hint (e.g. the shortcut name, never raw text)
    pub hint: Option<String>,
    /// Timestamp when the action occurred
    pub timestamp: DateTime<Utc>,
}

impl KeyActionEvent {
    pub fn new(action: KeyActionKind) -> Self {
        Self {
            action,
            hint: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_hint(action: KeyActionKind, hint: impl Into<String>) -> Self {
        Self {
            action,
            hint: Some(hint.into()),
            timestamp: Utc::now(),
        }
    }
}

/// A captured screenshot of the active window.
#[derive(Debug, Clone)]
pub struct ScreenshotEvent {
    /// Reference to the captured image
    pub capture: CaptureRef,
    /// Whether the capture succeeded
    pub success: bool,
    /// Timestamp when the capture was taken
    pub timestamp: DateTime<Utc>,
}

impl ScreenshotEvent {
    pub fn new(capture: CaptureRef, success: bool) -> Self {
        Self {
            capture,
            success,
            timestamp: Utc::now(),
        }
    }
}

/// Unified event type pushed by every producer.
#[derive(Debug, Clone)]
pub enum RawEvent {
    WindowChange(WindowChangeEvent),
    KeyAction(KeyActionEvent),
    ScreenshotCaptured(ScreenshotEvent),
}

impl RawEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RawEvent::WindowChange(e) => e.timestamp,
            RawEvent::KeyAction(e) => e.timestamp,
            RawEvent::ScreenshotCaptured(e) => e.timestamp,
        }
    }

    /// Short lowercase label for logging and activity records.
    pub fn kind(&self) -> &'static str {
        match self {
            RawEvent::WindowChange(_) => "window_change",
            RawEvent::KeyAction(_) => "key_action",
            RawEvent::ScreenshotCaptured(_) => "screenshot",
        }
    }
}

/// A pending request for screen-content analysis.
///
/// Created when the dispatcher sees a successful screenshot; consumed at
/// most once by the throttle. A request rejected by the interval gate is
/// dropped before it ever enters the queue.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Reference to the image to analyze
    pub capture: CaptureRef,
    /// Timestamp of the originating screenshot
    pub timestamp: DateTime<Utc>,
}

impl AnalysisRequest {
    pub fn new(capture: CaptureRef) -> Self {
        Self {
            capture,
            timestamp: Utc::now(),
        }
    }
}
