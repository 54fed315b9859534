//! Destinations for collected samples.

use tracing::info;

use super::AGENT_TARGET;
use super::collector::Sample;

/// Destination for collected samples.
pub trait SampleSink {
    /// Publishes the samples produced by `collector`.
    fn publish(&mut self, collector: &str, samples: &[Sample]);
}

/// Sink emitting one structured `tracing` event per sample.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SampleSink for TracingSink {
    fn publish(&mut self, collector: &str, samples: &[Sample]) {
        for sample in samples {
            info!(
                target: AGENT_TARGET,
                event = "sample",
                collector,
                metric = sample.metric,
                value = sample.value,
                labels = %render_labels(&sample.labels),
            );
        }
    }
}

fn render_labels(labels: &[(&'static str, String)]) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
