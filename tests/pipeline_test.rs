//! End-to-end tests for the event-aggregation pipeline, driven by
//! simulated sources and a stub OCR engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use taskscope::{
    analysis::StaticOcr,
    source::{SimulatedKeyboardHook, SimulatedScreenCapture, SimulatedWindowHook},
    KeyActionKind, MonitorConfig, MonitorSources, WorkflowMonitor,
};

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        analysis_interval: Duration::from_millis(50),
        screenshot_cadence: Duration::from_millis(30),
        dispatch_poll: Duration::from_millis(10),
        producer_poll: Duration::from_millis(10),
        join_timeout: Duration::from_millis(500),
        ..MonitorConfig::default()
    }
}

fn office_sources() -> MonitorSources {
    MonitorSources {
        window_hook: Box::new(SimulatedWindowHook::new(
            vec![("excel".to_string(), "Budget.xlsx".to_string())],
            Duration::from_secs(10),
        )),
        keyboard_hook: Box::new(SimulatedKeyboardHook::new(
            vec![KeyActionKind::Typing],
            Duration::from_millis(40),
        )),
        screen_capture: Box::new(SimulatedScreenCapture::new()),
        ocr: Arc::new(StaticOcr::from_text(
            "excel workbook cell formula sum save",
            0.9,
        )),
    }
}

#[test]
fn test_full_pipeline_detects_activity() {
    let mut monitor = WorkflowMonitor::new(fast_config(), office_sources());

    let live_results = Arc::new(AtomicUsize::new(0));
    let counter = live_results.clone();
    monitor.add_callback(Box::new(move |result| {
        assert!(result.ocr_confidence > 0.0);
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    monitor.start().unwrap();
    thread::sleep(Duration::from_millis(800));

    let stats = monitor.get_statistics();
    assert!(stats.total_events > 0);
    assert_eq!(stats.window_changes, 1);
    assert!(stats.key_actions > 0);
    assert!(stats.screenshots_taken > 0);
    assert!(stats.ocr_analyses > 0);

    let summary = monitor.get_live_summary();
    assert!(summary.contains("excel"), "summary was: {summary}");
    assert!(summary.contains("calculation") || summary.contains("data_entry"));

    assert!(live_results.load(Ordering::SeqCst) > 0);
    assert!(!monitor.get_recent_actions(50).is_empty());
    assert!(!monitor.get_workflow_sessions(10).is_empty());

    monitor.stop();
    assert!(!monitor.is_running());
}

#[test]
fn test_throttle_limits_analysis_rate() {
    let config = MonitorConfig {
        // Captures arrive far faster than the gate allows through.
        analysis_interval: Duration::from_secs(10),
        ..fast_config()
    };
    let mut monitor = WorkflowMonitor::new(config, office_sources());

    monitor.start().unwrap();
    thread::sleep(Duration::from_millis(500));
    monitor.stop();

    let stats = monitor.get_statistics();
    assert!(stats.screenshots_taken >= 3);
    assert_eq!(stats.ocr_analyses, 1);
    assert!(stats.analyses_throttled >= 2);
}

#[test]
fn test_panicking_callback_does_not_break_delivery() {
    let mut monitor = WorkflowMonitor::new(fast_config(), office_sources());

    monitor.add_callback(Box::new(|_| panic!("misbehaving observer")));
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    monitor.add_callback(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    monitor.start().unwrap();
    thread::sleep(Duration::from_millis(500));
    monitor.stop();

    // The panicking observer never prevented later deliveries.
    assert!(delivered.load(Ordering::SeqCst) >= 2);
    assert!(monitor.get_statistics().ocr_analyses >= 2);
}

#[test]
fn test_idempotent_start_does_not_duplicate_delivery() {
    let mut monitor = WorkflowMonitor::new(fast_config(), office_sources());

    monitor.start().unwrap();
    monitor.start().unwrap();
    thread::sleep(Duration::from_millis(300));
    monitor.stop();

    // The scripted hook emits exactly one window change in this span; a
    // duplicated producer set would have counted it twice.
    assert_eq!(monitor.get_statistics().window_changes, 1);
}

#[test]
fn test_stop_is_bounded_and_terminal() {
    let mut monitor = WorkflowMonitor::new(fast_config(), office_sources());
    monitor.start().unwrap();
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    monitor.stop();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(monitor.start().is_err());
}

#[test]
fn test_export_and_clear_logs() {
    let dir = std::env::temp_dir().join("taskscope-pipeline-export");
    let config = MonitorConfig {
        export_path: dir.clone(),
        ..fast_config()
    };
    let mut monitor = WorkflowMonitor::new(config, office_sources());

    monitor.start().unwrap();
    thread::sleep(Duration::from_millis(300));
    monitor.stop();

    let path = monitor.export_logs(None).unwrap();
    assert!(path.exists());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("recent_actions"));
    assert!(content.contains("sessions"));

    monitor.clear_logs();
    assert!(monitor.get_recent_actions(10).is_empty());
    assert!(monitor.get_workflow_sessions(10).is_empty());

    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_dir_all(dir);
}
