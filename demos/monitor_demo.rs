//! Runs the full monitoring pipeline against a simulated desktop for a
//! few seconds and prints what the agent concluded.
//!
//! Run with: cargo run --example monitor_demo

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use taskscope::{
    analysis::StaticOcr,
    source::{SimulatedKeyboardHook, SimulatedScreenCapture, SimulatedWindowHook},
    MonitorConfig, MonitorSources, WorkflowMonitor,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("Taskscope Monitor Demo");
    println!("======================");
    println!();

    let config = MonitorConfig {
        analysis_interval: Duration::from_secs(1),
        screenshot_cadence: Duration::from_millis(500),
        ..MonitorConfig::default()
    };

    let sources = MonitorSources {
        window_hook: Box::new(SimulatedWindowHook::office_rotation(Duration::from_secs(3))),
        keyboard_hook: Box::new(SimulatedKeyboardHook::typing_pattern(Duration::from_millis(
            200,
        ))),
        screen_capture: Box::new(SimulatedScreenCapture::with_app_hint("excel")),
        ocr: Arc::new(StaticOcr::from_text(
            "excel workbook cell formula sum save file total",
            0.9,
        )),
    };

    let mut monitor = WorkflowMonitor::new(config, sources);
    monitor.add_callback(Box::new(|result| {
        println!(
            "[analysis] {} task(s), {} app(s), ocr confidence {:.2}",
            result.detected_tasks.len(),
            result.applications.len(),
            result.ocr_confidence
        );
    }));

    monitor.start().expect("failed to start monitor");
    println!("Monitoring simulated desktop activity for 10 seconds...");
    println!();

    for _ in 0..5 {
        thread::sleep(Duration::from_secs(2));
        println!("[live] {}", monitor.get_live_summary());
    }

    monitor.stop();

    let status = monitor.get_current_status();
    println!();
    println!("Final state:");
    for task in &status.tasks {
        println!(
            "  task {} (confidence {:.2}, seen {}x)",
            task.name, task.confidence, task.count
        );
    }
    for app in &status.applications {
        println!(
            "  app {} (confidence {:.2}, seen {}x)",
            app.name, app.confidence, app.count
        );
    }

    let stats = status.statistics;
    println!();
    println!("Statistics:");
    println!("  events: {}", stats.total_events);
    println!("  window changes: {}", stats.window_changes);
    println!("  key actions: {}", stats.key_actions);
    println!("  screenshots: {}", stats.screenshots_taken);
    println!("  analyses: {}", stats.ocr_analyses);
    println!("  throttled: {}", stats.analyses_throttled);
}
