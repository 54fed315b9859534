use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::process::{BusyMarker, Payload, PayloadError, ShutdownFlag};

use super::AGENT_TARGET;
use super::collector::{Collector, SystemCollector};
use super::cpu::CpuCollector;
use super::disk::DiskCollector;
use super::network::NetworkCollector;
use super::sink::{SampleSink, TracingSink};

/// Periodic collection pass run as the daemon payload.
pub struct CollectionLoop<K = TracingSink> {
    collectors: Vec<Box<dyn Collector>>,
    sink: K,
    interval: Duration,
    lock_path: Option<PathBuf>,
}

impl CollectionLoop {
    /// Builds the default loop: every host collector publishing to `tracing`.
    pub fn system(interval: Duration, lock_path: Option<&Path>) -> Self {
        Self::new(TracingSink, interval)
            .with_collector(Box::new(SystemCollector::new()))
            .with_collector(Box::new(CpuCollector::new()))
            .with_collector(Box::new(DiskCollector::new()))
            .with_collector(Box::new(NetworkCollector::new()))
            .with_lock_file(lock_path)
    }
}

impl<K: SampleSink> CollectionLoop<K> {
    /// Builds a loop with no collectors.
    pub fn new(sink: K, interval: Duration) -> Self {
        Self {
            collectors: Vec::new(),
            sink,
            interval,
            lock_path: None,
        }
    }

    /// Adds a collector polled on every pass.
    #[must_use]
    pub fn with_collector(mut self, collector: Box<dyn Collector>) -> Self {
        self.collectors.push(collector);
        self
    }

    /// Sets the lock file held while a pass is in progress.
    #[must_use]
    pub fn with_lock_file(mut self, lock_path: Option<&Path>) -> Self {
        self.lock_path = lock_path.map(Path::to_path_buf);
        self
    }

    /// Sink receiving the samples.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Runs every collector once and returns the number of samples published.
    ///
    /// A failing collector is logged and skipped.
    pub fn collect_once(&mut self) -> usize {
        let _marker = match BusyMarker::optional(self.lock_path.as_deref()) {
            Ok(marker) => Some(marker),
            Err(error) => {
                warn!(
                    target: AGENT_TARGET,
                    error = %error,
                    "failed to create lock file; collecting without busy marker"
                );
                None
            }
        };
        let mut published = 0;
        for collector in &mut self.collectors {
            match collector.collect() {
                Ok(samples) => {
                    self.sink.publish(collector.name(), &samples);
                    published += samples.len();
                }
                Err(error) => warn!(
                    target: AGENT_TARGET,
                    collector = collector.name(),
                    error = %error,
                    "collector failed"
                ),
            }
        }
        published
    }
}

impl<K: SampleSink> Payload for CollectionLoop<K> {
    fn run(&mut self, shutdown: &ShutdownFlag) -> Result<(), PayloadError> {
        info!(
            target: AGENT_TARGET,
            interval_secs = self.interval.as_secs(),
            collectors = self.collectors.len(),
            "collection loop started"
        );
        while !shutdown.is_requested() {
            let published = self.collect_once();
            info!(target: AGENT_TARGET, samples = published, "collection pass complete");
            if shutdown.wait_timeout(self.interval) {
                break;
            }
        }
        info!(target: AGENT_TARGET, "collection loop stopped");
        Ok(())
    }
}
