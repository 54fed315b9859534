use std::env;
use std::path::PathBuf;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::logging::LogFormat;

/// File name of the PID file inside the runtime directory.
pub const PID_FILE_NAME: &str = "hostwatchd.pid";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Seconds between two collection passes of the agent loop.
pub const DEFAULT_COLLECTION_INTERVAL_SECS: u64 = 300;

/// Delay between polls while `stop` waits on the lock file or the process.
pub const DEFAULT_STOP_POLL_INTERVAL_MS: u64 = 300;

/// Default log filter expression.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default collection interval in seconds.
pub fn default_collection_interval_secs() -> u64 {
    DEFAULT_COLLECTION_INTERVAL_SECS
}

/// Default `stop` poll interval in milliseconds.
pub fn default_stop_poll_interval_ms() -> u64 {
    DEFAULT_STOP_POLL_INTERVAL_MS
}

/// Computes the default PID file location.
///
/// Prefers `$XDG_RUNTIME_DIR/hostwatch`; otherwise falls back to a per-user
/// directory under the system temporary directory.
pub fn default_pid_file() -> PathBuf {
    default_runtime_directory().join(PID_FILE_NAME)
}

/// Directory that holds runtime artefacts when nothing else is configured.
pub fn default_runtime_directory() -> PathBuf {
    #[cfg(unix)]
    {
        if let Some(mut dir) = runtime_dir() {
            dir.push("hostwatch");
            return dir;
        }
        let mut dir = env::temp_dir();
        dir.push("hostwatch");
        dir.push(user_namespace());
        dir
    }

    #[cfg(not(unix))]
    {
        let mut dir = env::temp_dir();
        dir.push("hostwatch");
        dir
    }
}

#[cfg(unix)]
fn user_namespace() -> String {
    // SAFETY: `geteuid` has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}
