//! Filesystem usage and block-device I/O counters.

use sysinfo::{Disk, Disks};

use super::collector::{Collector, CollectorError, Sample};

/// Collector reporting space per mount point and cumulative I/O per device.
///
/// RAM pseudo disks (`ram0`, `ram1`, ...) are skipped for I/O counters.
pub struct DiskCollector {
    disks: Disks,
}

impl DiskCollector {
    /// Builds a collector with the current list of mounted disks.
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for DiskCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for DiskCollector {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn collect(&mut self) -> Result<Vec<Sample>, CollectorError> {
        self.disks.refresh(true);
        let mut samples = Vec::new();
        for disk in self.disks.list() {
            samples.extend(space_samples(disk));
            samples.extend(io_samples(disk));
        }
        Ok(samples)
    }
}

fn space_samples(disk: &Disk) -> Vec<Sample> {
    let mount = disk.mount_point().to_string_lossy().into_owned();
    usage_samples(&mount, disk.total_space(), disk.available_space())
}

fn usage_samples(mount: &str, total: u64, available: u64) -> Vec<Sample> {
    let used = total.saturating_sub(available);
    let percent = if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    };
    [
        ("disk.total.bytes", total as f64),
        ("disk.used.bytes", used as f64),
        ("disk.free.bytes", available as f64),
        ("disk.used.percent", percent),
    ]
    .into_iter()
    .map(|(metric, value)| Sample::new(metric, value).with_label("mount", mount))
    .collect()
}

fn io_samples(disk: &Disk) -> Vec<Sample> {
    let device = disk.name().to_string_lossy();
    let device = device.rsplit('/').next().unwrap_or_default().to_owned();
    if device.is_empty() || is_ram_pseudo_disk(&device) {
        return Vec::new();
    }
    let usage = disk.usage();
    [
        ("disk.io.read.bytes", usage.total_read_bytes),
        ("disk.io.written.bytes", usage.total_written_bytes),
    ]
    .into_iter()
    .map(|(metric, value)| Sample::new(metric, value as f64).with_label("device", device.as_str()))
    .collect()
}

fn is_ram_pseudo_disk(device: &str) -> bool {
    device
        .strip_prefix("ram")
        .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|byte| byte.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("ram0", true)]
    #[case("ram15", true)]
    #[case("ram", false)]
    #[case("ramdisk", false)]
    #[case("sda", false)]
    #[case("nvme0n1", false)]
    fn recognises_ram_pseudo_disks(#[case] device: &str, #[case] expected: bool) {
        assert_eq!(is_ram_pseudo_disk(device), expected);
    }

    #[test]
    fn usage_reports_used_space_and_percentage() {
        let samples = usage_samples("/srv", 400, 100);
        let value = |metric: &str| {
            samples
                .iter()
                .find(|sample| sample.metric == metric)
                .map(|sample| sample.value)
        };
        assert_eq!(value("disk.used.bytes"), Some(300.0));
        assert_eq!(value("disk.free.bytes"), Some(100.0));
        assert_eq!(value("disk.used.percent"), Some(75.0));
        assert!(samples.iter().all(|sample| sample.label("mount") == Some("/srv")));
    }

    #[test]
    fn empty_filesystem_reports_zero_percent() {
        let samples = usage_samples("/proc", 0, 0);
        let percent = samples
            .iter()
            .find(|sample| sample.metric == "disk.used.percent")
            .map(|sample| sample.value);
        assert_eq!(percent, Some(0.0));
    }

    #[test]
    fn collect_labels_every_sample() {
        let mut collector = DiskCollector::new();
        let samples = collector.collect().expect("disk collection should not fail");
        for sample in &samples {
            assert!(
                sample.label("mount").is_some() || sample.label("device").is_some(),
                "{} has no mount or device label",
                sample.metric
            );
        }
    }
}
