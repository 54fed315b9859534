//! Sample model, the collector seam, and the host-wide system collector.

use sysinfo::{ProcessesToUpdate, System};
use thiserror::Error;

/// One named measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Dotted metric name, for example `system.load.1m`.
    pub metric: &'static str,
    /// Measured value.
    pub value: f64,
    /// Dimension labels such as the mount point or interface name.
    pub labels: Vec<(&'static str, String)>,
}

impl Sample {
    /// Builds an unlabelled sample.
    pub const fn new(metric: &'static str, value: f64) -> Self {
        Self {
            metric,
            value,
            labels: Vec::new(),
        }
    }

    /// Adds a dimension label.
    #[must_use]
    pub fn with_label(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.labels.push((key, value.into()));
        self
    }

    /// Value of the label named `key`, if set.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Errors reported by collectors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The collector could not take a measurement.
    #[error("collector '{collector}' failed: {message}")]
    Unavailable {
        /// Collector name.
        collector: &'static str,
        /// Human-readable cause.
        message: String,
    },
}

/// Source of samples polled once per collection pass.
pub trait Collector: Send {
    /// Stable collector name used in log fields.
    fn name(&self) -> &'static str;

    /// Takes one round of measurements.
    fn collect(&mut self) -> Result<Vec<Sample>, CollectorError>;
}

/// Collector reading load, uptime, process, and memory figures from the host.
pub struct SystemCollector {
    system: System,
}

impl SystemCollector {
    /// Builds a collector with an empty system snapshot.
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for SystemCollector {
    fn name(&self) -> &'static str {
        "system"
    }

    fn collect(&mut self) -> Result<Vec<Sample>, CollectorError> {
        self.system.refresh_memory();
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        let load = System::load_average();
        let total_memory = self.system.total_memory();
        if total_memory == 0 {
            return Err(CollectorError::Unavailable {
                collector: self.name(),
                message: String::from("host reported zero total memory"),
            });
        }
        Ok(vec![
            Sample::new("system.load.1m", load.one),
            Sample::new("system.load.5m", load.five),
            Sample::new("system.load.15m", load.fifteen),
            Sample::new("system.uptime.seconds", System::uptime() as f64),
            Sample::new("system.processes", self.system.processes().len() as f64),
            Sample::new("memory.total.bytes", total_memory as f64),
            Sample::new("memory.used.bytes", self.system.used_memory() as f64),
            Sample::new("swap.used.bytes", self.system.used_swap() as f64),
        ])
    }
}
