use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output encodings understood by the daemon's log subscriber.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    #[default]
    Json,
    /// Single-line human-readable events.
    Compact,
}

/// Error raised when a [`LogFormat`] cannot be parsed.
pub type LogFormatParseError = strum::ParseError;

/// Where the daemon writes its log events.
///
/// Once detached, standard error points at the null device, so a file sink is
/// the only way to keep events from a backgrounded collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Write to standard error.
    Stderr,
    /// Append to the given file.
    File(PathBuf),
}

impl LogSink {
    /// Chooses the sink for an optional configured log file.
    pub fn from_option(path: Option<&Path>) -> Self {
        path.map_or(Self::Stderr, |file| Self::File(file.to_path_buf()))
    }
}
