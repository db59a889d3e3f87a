//! Configuration for the workflow monitor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the monitoring pipeline.
///
/// Every component receives its settings from this struct at construction;
/// there is no process-wide configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Minimum interval between screen analyses (throttle gate)
    #[serde(with = "duration_serde")]
    pub analysis_interval: Duration,

    /// How often the screenshot producer captures the active window
    #[serde(with = "duration_serde")]
    pub screenshot_cadence: Duration,

    /// Sleep between dispatcher poll cycles
    #[serde(with = "duration_serde")]
    pub dispatch_poll: Duration,

    /// Poll timeout producers pass to their external sources
    #[serde(with = "duration_serde")]
    pub producer_poll: Duration,

    /// Window within which repeated task observations merge
    #[serde(with = "duration_serde")]
    pub task_merge_window: Duration,

    /// Age at which task entries are evicted
    #[serde(with = "duration_serde")]
    pub task_retention: Duration,

    /// Idle time at which application entries are evicted
    #[serde(with = "duration_serde")]
    pub app_retention: Duration,

    /// Bound on every thread join during shutdown
    #[serde(with = "duration_serde")]
    pub join_timeout: Duration,

    /// Capacity of the shared raw-event queue
    pub event_queue_capacity: usize,

    /// Capacity of the pending-analysis queue
    pub analysis_queue_capacity: usize,

    /// Size of the recent-actions ring buffer
    pub recent_actions_capacity: usize,

    /// Directory for exported activity logs
    pub export_path: PathBuf,

    /// Directory for monitor state
    pub data_path: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskscope");

        Self {
            analysis_interval: Duration::from_secs(3),
            screenshot_cadence: Duration::from_secs(2),
            dispatch_poll: Duration::from_millis(100),
            producer_poll: Duration::from_millis(100),
            task_merge_window: Duration::from_secs(10),
            task_retention: Duration::from_secs(30),
            app_retention: Duration::from_secs(60),
            join_timeout: Duration::from_secs(2),
            event_queue_capacity: 10_000,
            analysis_queue_capacity: 4,
            recent_actions_capacity: 1000,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::Io(e.to_string()))?;
            let config: MonitorConfig =
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(&config_path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskscope")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Serialize(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "parse error: {e}"),
            ConfigError::Serialize(e) => write!(f, "serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration, stored as whole milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
