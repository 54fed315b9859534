//! Shared configuration for the hostwatch agent.
//!
//! Settings are layered by `ortho_config`: built-in defaults, then a TOML
//! file (`--config-path` or `HOSTWATCH_CONFIG_PATH`), then `HOSTWATCH_*`
//! environment variables, then command-line flags. The daemon controller and
//! the collection loop both read from the resulting [`Config`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod runtime;
mod validation;

pub use defaults::{
    DEFAULT_COLLECTION_INTERVAL_SECS, DEFAULT_LOG_FILTER, DEFAULT_STOP_POLL_INTERVAL_MS,
    PID_FILE_NAME, default_collection_interval_secs, default_log_filter,
    default_log_filter_string, default_log_format, default_pid_file, default_runtime_directory,
    default_stop_poll_interval_ms,
};
pub use logging::{LogFormat, LogFormatParseError, LogSink};
pub use runtime::{RuntimePaths, RuntimePathsError};
pub use validation::ConfigValidationError;

/// Resolved agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "HOSTWATCH")]
pub struct Config {
    /// PID file recording the running daemon.
    #[serde(default = "default_pid_file")]
    #[ortho_config(default = default_pid_file())]
    pub pid_file: PathBuf,
    /// Optional cooperative lock file marking busy periods of the work loop.
    #[serde(default)]
    pub lock_file: Option<PathBuf>,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log encoding.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Optional file receiving log events instead of standard error.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Seconds between collection passes.
    #[serde(default = "default_collection_interval_secs")]
    #[ortho_config(default = default_collection_interval_secs())]
    pub collection_interval_secs: u64,
    /// Milliseconds between polls while stopping the daemon.
    #[serde(default = "default_stop_poll_interval_ms")]
    #[ortho_config(default = default_stop_poll_interval_ms())]
    pub stop_poll_interval_ms: u64,
    /// Upper bound on `stop`; unbounded when absent.
    #[serde(default)]
    pub stop_timeout_secs: Option<u64>,
    /// Claim the PID file atomically before forking.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub exclusive_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pid_file: default_pid_file(),
            lock_file: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_file: None,
            collection_interval_secs: DEFAULT_COLLECTION_INTERVAL_SECS,
            stop_poll_interval_ms: DEFAULT_STOP_POLL_INTERVAL_MS,
            stop_timeout_secs: None,
            exclusive_start: false,
        }
    }
}

impl Config {
    /// Configured PID file path, possibly relative.
    pub fn pid_file(&self) -> &Path {
        self.pid_file.as_path()
    }

    /// Configured lock file path, possibly relative.
    pub fn lock_file(&self) -> Option<&Path> {
        self.lock_file.as_deref()
    }

    /// Log filter expression.
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log encoding.
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Destination of log events.
    pub fn log_sink(&self) -> LogSink {
        LogSink::from_option(self.log_file.as_deref())
    }

    /// Interval between collection passes.
    pub fn collection_interval(&self) -> Duration {
        Duration::from_secs(self.collection_interval_secs)
    }

    /// Delay between polls while stopping the daemon.
    pub fn stop_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stop_poll_interval_ms)
    }

    /// Optional bound on how long `stop` waits.
    pub fn stop_timeout(&self) -> Option<Duration> {
        self.stop_timeout_secs.map(Duration::from_secs)
    }

    /// Whether starts claim the PID file atomically.
    pub fn exclusive_start(&self) -> bool {
        self.exclusive_start
    }
}
