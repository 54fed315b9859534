//! Per-interface network counters.

use sysinfo::{NetworkData, Networks};

use super::collector::{Collector, CollectorError, Sample};

/// Collector reporting cumulative traffic and error counters per interface.
pub struct NetworkCollector {
    networks: Networks,
}

impl NetworkCollector {
    /// Builds a collector with the current list of interfaces.
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for NetworkCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for NetworkCollector {
    fn name(&self) -> &'static str {
        "network"
    }

    fn collect(&mut self) -> Result<Vec<Sample>, CollectorError> {
        self.networks.refresh(true);
        Ok(self
            .networks
            .iter()
            .flat_map(|(interface, data)| interface_samples(interface, &Counters::from(data)))
            .collect())
    }
}

/// Cumulative counters of one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    bytes_received: u64,
    bytes_sent: u64,
    packets_received: u64,
    packets_sent: u64,
    errors_received: u64,
    errors_sent: u64,
}

impl From<&NetworkData> for Counters {
    fn from(data: &NetworkData) -> Self {
        Self {
            bytes_received: data.total_received(),
            bytes_sent: data.total_transmitted(),
            packets_received: data.total_packets_received(),
            packets_sent: data.total_packets_transmitted(),
            errors_received: data.total_errors_on_received(),
            errors_sent: data.total_errors_on_transmitted(),
        }
    }
}

fn interface_samples(interface: &str, counters: &Counters) -> Vec<Sample> {
    [
        ("network.received.bytes", counters.bytes_received),
        ("network.sent.bytes", counters.bytes_sent),
        ("network.received.packets", counters.packets_received),
        ("network.sent.packets", counters.packets_sent),
        ("network.received.errors", counters.errors_received),
        ("network.sent.errors", counters.errors_sent),
    ]
    .into_iter()
    .map(|(metric, value)| Sample::new(metric, value as f64).with_label("interface", interface))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_counters_become_labelled_samples() {
        let counters = Counters {
            bytes_received: 2048,
            bytes_sent: 1024,
            packets_received: 12,
            packets_sent: 8,
            errors_received: 1,
            errors_sent: 0,
        };
        let samples = interface_samples("eth0", &counters);

        assert_eq!(samples.len(), 6);
        assert!(samples.iter().all(|sample| sample.label("interface") == Some("eth0")));
        let received = samples
            .iter()
            .find(|sample| sample.metric == "network.received.bytes")
            .map(|sample| sample.value);
        assert_eq!(received, Some(2048.0));
    }

    #[test]
    fn collect_reports_every_interface() {
        let mut collector = NetworkCollector::new();
        let samples = collector.collect().expect("network collection should not fail");
        assert_eq!(samples.len() % 6, 0);
    }
}
