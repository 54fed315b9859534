//! Processor count and utilisation.

use sysinfo::System;

use super::collector::{Collector, CollectorError, Sample};

/// Collector reporting overall and per-core CPU usage.
///
/// Usage is measured between consecutive refreshes, so the first pass after
/// construction compares against the snapshot taken in [`CpuCollector::new`].
pub struct CpuCollector {
    system: System,
}

impl CpuCollector {
    /// Builds a collector and takes the baseline CPU snapshot.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        Self { system }
    }
}

impl Default for CpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for CpuCollector {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn collect(&mut self) -> Result<Vec<Sample>, CollectorError> {
        self.system.refresh_cpu_all();
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(CollectorError::Unavailable {
                collector: self.name(),
                message: String::from("host reported no processors"),
            });
        }
        let mut samples = Vec::with_capacity(cpus.len() + 2);
        samples.push(Sample::new("cpu.count", cpus.len() as f64));
        samples.push(Sample::new(
            "cpu.usage.percent",
            f64::from(self.system.global_cpu_usage()),
        ));
        for (index, cpu) in cpus.iter().enumerate() {
            samples.push(
                Sample::new("cpu.core.usage.percent", f64::from(cpu.cpu_usage()))
                    .with_label("core", index.to_string()),
            );
        }
        Ok(samples)
    }
}
