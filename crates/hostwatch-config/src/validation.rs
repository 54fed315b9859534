//! Checks applied after the configuration layers are merged.

use thiserror::Error;

use crate::Config;

/// Settings that parse but cannot drive the agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    /// A zero collection interval would run passes back to back.
    #[error("collection_interval_secs must be at least 1")]
    ZeroCollectionInterval,
    /// A zero poll interval would busy-loop while stopping.
    #[error("stop_poll_interval_ms must be at least 1")]
    ZeroStopPollInterval,
}

impl Config {
    /// Rejects values the collection loop or the stop loop cannot honour.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.collection_interval_secs == 0 {
            return Err(ConfigValidationError::ZeroCollectionInterval);
        }
        if self.stop_poll_interval_ms == 0 {
            return Err(ConfigValidationError::ZeroStopPollInterval);
        }
        Ok(())
    }
}
