//! Taskscope CLI
//!
//! Real-time desktop workflow awareness agent.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use taskscope::{
    analysis::StaticOcr,
    source::{
        NoopKeyboardHook, NoopScreenCapture, NoopWindowHook, SimulatedKeyboardHook,
        SimulatedScreenCapture, SimulatedWindowHook,
    },
    MonitorConfig, MonitorSources, WorkflowMonitor, VERSION,
};

#[derive(Parser)]
#[command(name = "taskscope")]
#[command(version = VERSION)]
#[command(about = "Real-time desktop workflow awareness agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring desktop activity
    Start {
        /// Drive the pipeline from simulated desktop activity
        #[arg(long)]
        simulate: bool,

        /// Minimum seconds between screen analyses
        #[arg(long)]
        interval: Option<u64>,

        /// Seconds between screenshot captures
        #[arg(long)]
        cadence: Option<u64>,

        /// Stop automatically after this many seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Seconds between live-summary prints
        #[arg(long, default_value = "5")]
        summary_every: u64,
    },

    /// Show configuration and cumulative state
    Status,

    /// Show configuration
    Config,

    /// List exported activity logs
    Export,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            simulate,
            interval,
            cadence,
            duration,
            summary_every,
        } => {
            cmd_start(simulate, interval, cadence, duration, summary_every);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::Export => {
            cmd_export();
        }
    }
}

fn cmd_start(
    simulate: bool,
    interval: Option<u64>,
    cadence: Option<u64>,
    duration: Option<u64>,
    summary_every: u64,
) {
    println!("Taskscope v{VERSION}");
    println!();

    let mut config = MonitorConfig::load().unwrap_or_default();
    if let Some(secs) = interval {
        config.analysis_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = cadence {
        config.screenshot_cadence = Duration::from_secs(secs);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: could not create directories: {e}");
    }

    println!("Starting monitor...");
    println!("  Analysis interval: {}s", config.analysis_interval.as_secs());
    println!(
        "  Screenshot cadence: {}s",
        config.screenshot_cadence.as_secs()
    );
    println!(
        "  Mode: {}",
        if simulate { "simulated" } else { "platform hooks" }
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let sources = if simulate {
        MonitorSources {
            window_hook: Box::new(SimulatedWindowHook::office_rotation(Duration::from_secs(8))),
            keyboard_hook: Box::new(SimulatedKeyboardHook::typing_pattern(
                Duration::from_millis(400),
            )),
            screen_capture: Box::new(SimulatedScreenCapture::with_app_hint("excel")),
            ocr: Arc::new(StaticOcr::from_text(
                "excel workbook cell formula sum save file total",
                0.9,
            )),
        }
    } else {
        // Platform hook integrations plug in here; without them the noop
        // sources keep the pipeline idle but healthy.
        MonitorSources {
            window_hook: Box::new(NoopWindowHook),
            keyboard_hook: Box::new(NoopKeyboardHook),
            screen_capture: Box::new(NoopScreenCapture),
            ocr: Arc::new(StaticOcr::from_text("", 0.0)),
        }
    };

    let mut monitor = WorkflowMonitor::new(config, sources);
    if let Err(e) = monitor.start() {
        eprintln!("Error starting monitor: {e}");
        std::process::exit(1);
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let started = Instant::now();
    let mut last_summary = Instant::now();

    while running.load(Ordering::SeqCst) {
        if let Some(secs) = duration {
            if started.elapsed() >= Duration::from_secs(secs) {
                break;
            }
        }
        if last_summary.elapsed() >= Duration::from_secs(summary_every.max(1)) {
            println!("[live] {}", monitor.get_live_summary());
            last_summary = Instant::now();
        }
        thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping monitor...");
    monitor.stop();

    match monitor.export_logs(None) {
        Ok(path) => println!("Activity log exported to {path:?}"),
        Err(e) => eprintln!("Warning: could not export activity log: {e}"),
    }

    let stats = monitor.get_statistics();
    println!();
    println!("Session Statistics:");
    println!("  Total events: {}", stats.total_events);
    println!("  Window changes: {}", stats.window_changes);
    println!("  Key actions: {}", stats.key_actions);
    println!("  Screenshots: {}", stats.screenshots_taken);
    println!("  Screen analyses: {}", stats.ocr_analyses);
    println!("  Analyses throttled: {}", stats.analyses_throttled);
    println!("  Runtime: {}s", stats.runtime_secs);
}

fn cmd_status() {
    let config = MonitorConfig::load().unwrap_or_default();

    println!("Taskscope Status");
    println!("================");
    println!();
    println!("Configuration:");
    println!(
        "  Analysis interval: {}s",
        config.analysis_interval.as_secs()
    );
    println!(
        "  Screenshot cadence: {}s",
        config.screenshot_cadence.as_secs()
    );
    println!(
        "  Task merge window: {}s",
        config.task_merge_window.as_secs()
    );
    println!("  Task retention: {}s", config.task_retention.as_secs());
    println!("  App retention: {}s", config.app_retention.as_secs());
    println!("  Export path: {:?}", config.export_path);

    let exports = std::fs::read_dir(&config.export_path)
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0);
    println!();
    println!("Exported activity logs: {exports}");
}

fn cmd_config() {
    let config = MonitorConfig::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", MonitorConfig::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_export() {
    let config = MonitorConfig::load().unwrap_or_default();

    let files: Vec<PathBuf> = std::fs::read_dir(&config.export_path)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
                .collect()
        })
        .unwrap_or_default();

    if files.is_empty() {
        println!("No exported activity logs in {:?}", config.export_path);
        println!("Run 'taskscope start' to begin monitoring.");
        return;
    }

    println!("Activity logs in {:?}:", config.export_path);
    for file in files {
        println!("  {file:?}");
    }
}
