//! Screen content analysis: OCR boundary, analyzer, and the throttled
//! analysis queue with its worker thread.

pub mod analyzer;
pub mod ocr;
pub mod throttle;

pub use analyzer::{AnalysisResult, ScreenAnalyzer};
pub use ocr::{OcrEngine, OcrOutput, OcrToken, StaticOcr};
pub use throttle::{AnalysisQueue, AnalysisWorker, SubmitOutcome};

use crate::classify::{AppMatch, TaskMatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

/// Errors raised during screen content analysis.
#[derive(Debug)]
pub enum AnalysisError {
    /// The OCR engine failed or returned malformed output
    Ocr(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Ocr(s) => write!(f, "OCR failure: {s}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Delivered to registered observers after each accepted analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveResult {
    pub timestamp: DateTime<Utc>,
    /// Task matches from this analysis, strongest first
    pub detected_tasks: Vec<TaskMatch>,
    /// Application matches from this analysis, strongest first
    pub applications: Vec<AppMatch>,
    /// Mean OCR token confidence for this analysis
    pub ocr_confidence: f64,
}

impl LiveResult {
    pub fn from_analysis(result: &AnalysisResult) -> Self {
        Self {
            timestamp: result.timestamp,
            detected_tasks: result.tasks.clone(),
            applications: result.applications.clone(),
            ocr_confidence: result.overall_confidence,
        }
    }
}

/// Observer callback invoked with each live result.
pub type LiveCallback = Box<dyn Fn(&LiveResult) + Send + Sync>;

/// Registry of observer callbacks with per-callback isolation.
///
/// A callback that panics is caught and logged; it never breaks delivery
/// to the remaining observers or the invoking thread.
#[derive(Default)]
pub struct ObserverRegistry {
    callbacks: Mutex<Vec<LiveCallback>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: LiveCallback) {
        self.callbacks
            .lock()
            .expect("observer registry lock poisoned")
            .push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks
            .lock()
            .expect("observer registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every registered callback synchronously.
    pub fn notify(&self, result: &LiveResult) {
        let callbacks = self
            .callbacks
            .lock()
            .expect("observer registry lock poisoned");
        for (index, callback) in callbacks.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| callback(result))).is_err() {
                tracing::warn!(index, "observer callback panicked; continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn empty_result() -> LiveResult {
        LiveResult {
            timestamp: Utc::now(),
            detected_tasks: Vec::new(),
            applications: Vec::new(),
            ocr_confidence: 0.0,
        }
    }

    #[test]
    fn test_all_callbacks_invoked() {
        let registry = ObserverRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = count.clone();
            registry.add(Box::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        registry.notify(&empty_result());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let registry = ObserverRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        registry.add(Box::new(|_| panic!("misbehaving observer")));
        let c = count.clone();
        registry.add(Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        registry.notify(&empty_result());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
