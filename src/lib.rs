//! Taskscope - real-time desktop workflow awareness.
//!
//! This library turns a stream of raw desktop events (active-window
//! changes, key actions, periodic screenshots) into a decaying,
//! de-duplicated picture of what the user is currently doing: which
//! applications are active and which task categories are being performed,
//! with confidence that rises on repeated evidence and ages out of scope.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Taskscope Agent                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐ ┌──────────┐ ┌────────────┐                    │
//! │  │  Window  │ │ Keyboard │ │ Screenshot │   producers        │
//! │  │  Watcher │ │  Watcher │ │   Timer    │                    │
//! │  └────┬─────┘ └────┬─────┘ └─────┬──────┘                    │
//! │       └────────────┼─────────────┘                           │
//! │                    ▼                                         │
//! │            shared event queue ──▶ Dispatcher ──▶ Statistics  │
//! │                                      │          Activity log │
//! │                                      ▼                       │
//! │                     Throttle ──▶ Screen Analyzer (OCR)       │
//! │                                      │                       │
//! │                                      ▼                       │
//! │                Classifier ──▶ Aggregator ──▶ live summary,   │
//! │                               (decaying)     callbacks       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The OS-level hooks, screen capture, and the OCR engine are external
//! collaborators consumed through the traits in [`source`] and
//! [`analysis::ocr`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskscope::{
//!     analysis::StaticOcr,
//!     source::{NoopKeyboardHook, NoopScreenCapture, NoopWindowHook},
//!     MonitorConfig, MonitorSources, WorkflowMonitor,
//! };
//!
//! let sources = MonitorSources {
//!     window_hook: Box::new(NoopWindowHook),
//!     keyboard_hook: Box::new(NoopKeyboardHook),
//!     screen_capture: Box::new(NoopScreenCapture),
//!     ocr: Arc::new(StaticOcr::from_text("", 0.0)),
//! };
//! let mut monitor = WorkflowMonitor::new(MonitorConfig::default(), sources);
//! monitor.start().expect("failed to start monitor");
//! println!("{}", monitor.get_live_summary());
//! monitor.stop();
//! ```

pub mod activity;
pub mod analysis;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod monitor;
pub mod producer;
pub mod source;
pub mod state;
pub mod stats;

// Re-export key types at crate root for convenience
pub use activity::{ActionRecord, ActivityLog, WorkflowSession};
pub use analysis::{AnalysisResult, LiveResult, ObserverRegistry, ScreenAnalyzer};
pub use classify::{classify, Classification, RuleSet};
pub use config::{ConfigError, MonitorConfig};
pub use monitor::{MonitorError, MonitorSources, MonitorStatus, WorkflowMonitor};
pub use producer::{KeyActionKind, RawEvent};
pub use state::{ActivityAggregator, DetectedApplication, DetectedTask, EMPTY_SUMMARY};
pub use stats::{MonitorStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
