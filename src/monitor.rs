//! Workflow monitor: the coordinator owning every pipeline component.
//!
//! Construction wires the producers, dispatcher, throttle, analyzer, and
//! aggregator together through explicit shared handles; `start()` and
//! `stop()` manage all thread lifecycles. Shutdown is best-effort-bounded:
//! every join observes the configured timeout and proceeds with a warning
//! if a thread fails to exit.

use crate::activity::{ActionRecord, ActivityLog, WorkflowSession};
use crate::analysis::throttle::{AnalysisQueue, AnalysisWorker};
use crate::analysis::{LiveCallback, ObserverRegistry, OcrEngine, ScreenAnalyzer};
use crate::classify::RuleSet;
use crate::config::MonitorConfig;
use crate::producer::types::RawEvent;
use crate::producer::{KeyWatcher, ScreenshotTimer, WindowWatcher};
use crate::source::{KeyboardHook, ScreenCapture, WindowHook};
use crate::state::{ActivityAggregator, DetectedApplication, DetectedTask};
use crate::stats::{MonitorStats, StatsSnapshot};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Coordinator misuse and query errors.
#[derive(Debug)]
pub enum MonitorError {
    /// `start()` was called on an instance that has been stopped
    TornDown,
    /// Log export failed
    Export(String),
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::TornDown => {
                write!(f, "monitor has been stopped; build a fresh instance to restart")
            }
            MonitorError::Export(e) => write!(f, "log export failed: {e}"),
        }
    }
}

impl std::error::Error for MonitorError {}

/// The external collaborators handed to the monitor at construction.
pub struct MonitorSources {
    pub window_hook: Box<dyn WindowHook>,
    pub keyboard_hook: Box<dyn KeyboardHook>,
    pub screen_capture: Box<dyn ScreenCapture>,
    pub ocr: Arc<dyn OcrEngine>,
}

/// Point-in-time view of the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub running: bool,
    pub statistics: StatsSnapshot,
    pub tasks: Vec<DetectedTask>,
    pub applications: Vec<DetectedApplication>,
    pub pending_analyses: usize,
}

/// Owns and coordinates the full event-aggregation pipeline.
pub struct WorkflowMonitor {
    config: MonitorConfig,
    stats: Arc<MonitorStats>,
    aggregator: Arc<ActivityAggregator>,
    activity: Arc<ActivityLog>,
    observers: Arc<ObserverRegistry>,
    analysis_queue: Arc<AnalysisQueue>,
    analyzer: Arc<ScreenAnalyzer>,
    event_sender: Sender<RawEvent>,
    event_receiver: Receiver<RawEvent>,
    sources: Option<MonitorSources>,
    window_watcher: Option<WindowWatcher>,
    key_watcher: Option<KeyWatcher>,
    screenshot_timer: Option<ScreenshotTimer>,
    dispatcher: Option<crate::dispatch::Dispatcher>,
    worker: Option<AnalysisWorker>,
    running: bool,
    torn_down: bool,
}

impl WorkflowMonitor {
    /// Build a monitor with the default classification rules.
    pub fn new(config: MonitorConfig, sources: MonitorSources) -> Self {
        Self::with_rules(config, sources, RuleSet::default_rules())
    }

    /// Build a monitor with a custom rule set.
    pub fn with_rules(config: MonitorConfig, sources: MonitorSources, rules: RuleSet) -> Self {
        let (event_sender, event_receiver) = bounded(config.event_queue_capacity);
        let analyzer = Arc::new(ScreenAnalyzer::new(sources.ocr.clone(), Arc::new(rules)));
        let aggregator = Arc::new(ActivityAggregator::new(
            config.task_merge_window,
            config.task_retention,
            config.app_retention,
        ));
        let analysis_queue = Arc::new(AnalysisQueue::new(
            config.analysis_interval,
            config.analysis_queue_capacity,
        ));
        let activity = Arc::new(ActivityLog::new(config.recent_actions_capacity));

        Self {
            stats: Arc::new(MonitorStats::new()),
            aggregator,
            activity,
            observers: Arc::new(ObserverRegistry::new()),
            analysis_queue,
            analyzer,
            event_sender,
            event_receiver,
            sources: Some(sources),
            window_watcher: None,
            key_watcher: None,
            screenshot_timer: None,
            dispatcher: None,
            worker: None,
            running: false,
            torn_down: false,
            config,
        }
    }

    /// Start every producer, the dispatcher, and the analysis worker.
    ///
    /// Idempotent: calling `start()` while running warns and returns Ok.
    /// A producer whose source fails to initialize is disabled with a
    /// warning; the rest of the pipeline still starts. Starting a monitor
    /// that has been stopped is a programmer error.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.running {
            tracing::warn!("start() called on a running monitor; ignoring");
            return Ok(());
        }
        if self.torn_down {
            return Err(MonitorError::TornDown);
        }

        let sources = self.sources.take().ok_or(MonitorError::TornDown)?;

        let mut window_watcher = WindowWatcher::new(
            sources.window_hook,
            self.event_sender.clone(),
            self.stats.clone(),
            self.config.producer_poll,
        );
        match window_watcher.start() {
            Ok(()) => self.window_watcher = Some(window_watcher),
            Err(e) => tracing::warn!(error = %e, "window watcher disabled"),
        }

        let mut key_watcher = KeyWatcher::new(
            sources.keyboard_hook,
            self.event_sender.clone(),
            self.stats.clone(),
            self.config.producer_poll,
        );
        match key_watcher.start() {
            Ok(()) => self.key_watcher = Some(key_watcher),
            Err(e) => tracing::warn!(error = %e, "key watcher disabled"),
        }

        let mut screenshot_timer = ScreenshotTimer::new(
            sources.screen_capture,
            self.event_sender.clone(),
            self.stats.clone(),
            self.config.screenshot_cadence,
            self.config.producer_poll,
        );
        match screenshot_timer.start() {
            Ok(()) => self.screenshot_timer = Some(screenshot_timer),
            Err(e) => tracing::warn!(error = %e, "screenshot timer disabled"),
        }

        self.worker = Some(AnalysisWorker::spawn(
            self.analysis_queue.clone(),
            self.analyzer.clone(),
            self.aggregator.clone(),
            self.stats.clone(),
            self.observers.clone(),
            self.config.dispatch_poll,
        ));

        self.dispatcher = Some(crate::dispatch::Dispatcher::spawn(
            self.event_receiver.clone(),
            self.analysis_queue.clone(),
            self.stats.clone(),
            self.activity.clone(),
            self.config.dispatch_poll,
        ));

        self.running = true;
        tracing::info!("workflow monitor started");
        Ok(())
    }

    /// Stop all threads, each joined within the configured timeout.
    ///
    /// Terminal: after `stop()` this instance cannot be restarted.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        let timeout = self.config.join_timeout;

        if let Some(mut watcher) = self.window_watcher.take() {
            watcher.stop(timeout);
        }
        if let Some(mut watcher) = self.key_watcher.take() {
            watcher.stop(timeout);
        }
        if let Some(mut timer) = self.screenshot_timer.take() {
            timer.stop(timeout);
        }
        if let Some(mut dispatcher) = self.dispatcher.take() {
            dispatcher.stop(timeout);
        }
        if let Some(mut worker) = self.worker.take() {
            worker.stop(timeout);
        }

        self.activity.close_current_session();
        self.running = false;
        self.torn_down = true;
        tracing::info!("workflow monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Register an observer invoked after each accepted analysis.
    pub fn add_callback(&self, callback: LiveCallback) {
        self.observers.add(callback);
    }

    /// Copy-on-read statistics snapshot.
    pub fn get_statistics(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Full point-in-time pipeline status.
    pub fn get_current_status(&self) -> MonitorStatus {
        MonitorStatus {
            running: self.running,
            statistics: self.stats.snapshot(),
            tasks: self.aggregator.tasks_snapshot(),
            applications: self.aggregator.applications_snapshot(),
            pending_analyses: self.analysis_queue.pending(),
        }
    }

    /// Human-readable rendering of the current aggregator state.
    pub fn get_live_summary(&self) -> String {
        self.aggregator.summary()
    }

    pub fn get_recent_actions(&self, limit: usize) -> Vec<ActionRecord> {
        self.activity.recent_actions(limit)
    }

    pub fn get_workflow_sessions(&self, limit: usize) -> Vec<WorkflowSession> {
        self.activity.workflow_sessions(limit)
    }

    /// Export statistics, recent actions, and sessions as JSON.
    pub fn export_logs(&self, path: Option<PathBuf>) -> Result<PathBuf, MonitorError> {
        self.activity
            .export(path, self.stats.snapshot(), &self.config.export_path)
            .map_err(|e| MonitorError::Export(e.to_string()))
    }

    /// Drop all recorded actions and sessions.
    pub fn clear_logs(&self) {
        self.activity.clear();
    }

    /// The aggregator handle, for consumers polling live state directly.
    pub fn aggregator(&self) -> Arc<ActivityAggregator> {
        self.aggregator.clone()
    }
}

impl Drop for WorkflowMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
