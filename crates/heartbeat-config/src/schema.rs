//! Configuration schema definitions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Heartbeat file used when nothing else is configured.
pub const DEFAULT_LOG_FILE: &str = "/tmp/my_service_log.txt";

/// Seconds between two `Tick at` records.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 10;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Resolve relative paths against `base`.
    ///
    /// Detaching changes the working directory to `/`, so anything relative
    /// must be pinned to the launch directory first.
    pub fn resolve_relative_paths(&mut self, base: &Path) {
        if self.daemon.log_file.is_relative() {
            self.daemon.log_file = base.join(&self.daemon.log_file);
        }
        if let Some(dir) = self.logging.dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

/// How the detached process treats its inherited standard streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdioMode {
    /// Point stdin/stdout/stderr at `/dev/null`.
    #[default]
    Null,
    /// Close descriptors 0, 1 and 2 outright.
    Close,
}

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Append-only heartbeat file.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Interval between ticks (in seconds).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Whether to detach (double fork) from the terminal.
    /// Set to false when running under a supervisor or for debugging.
    #[serde(default = "default_detach")]
    pub detach: bool,

    /// Standard stream handling after detachment.
    #[serde(default)]
    pub stdio: StdioMode,
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_SECS
}

fn default_detach() -> bool {
    true
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            tick_interval_secs: default_tick_interval(),
            detach: default_detach(),
            stdio: StdioMode::default(),
        }
    }
}

impl DaemonConfig {
    /// Create a daemon config writing to the given heartbeat file.
    pub fn with_log_file(log_file: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
            ..Default::default()
        }
    }

    /// Get the tick interval as a Duration.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

/// Diagnostic logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rotated diagnostic logs. Console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
