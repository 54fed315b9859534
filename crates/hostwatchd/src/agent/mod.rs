//! Host-metrics work loop run inside the daemon.
//!
//! Each collector produces labelled [`Sample`]s, a [`SampleSink`] publishes
//! them, and the [`CollectionLoop`] drives both on a fixed interval while
//! holding the busy marker around each pass.

mod collection;
mod collector;
mod cpu;
mod disk;
mod network;
mod sink;

pub use collection::CollectionLoop;
pub use collector::{Collector, CollectorError, Sample, SystemCollector};
pub use cpu::CpuCollector;
pub use disk::DiskCollector;
pub use network::NetworkCollector;
pub use sink::{SampleSink, TracingSink};

pub(crate) const AGENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::agent");
