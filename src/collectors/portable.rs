use super::MetricsCollector;
use crate::model::Field;
use std::io;
use sysinfo::{Disks, MemoryRefreshKind, RefreshKind, System};

/// Collector for hosts without /proc. Everything comes from sysinfo, so the
/// field set is narrower than on Linux.
pub struct PortableCollector {
    sys: System,
    disks: Disks,
}

impl PortableCollector {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        );
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for PortableCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector for PortableCollector {
    fn memory(&mut self) -> io::Result<Vec<Field>> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory() as f64;
        let available = self.sys.available_memory() as f64;
        let percent = if total > 0.0 {
            ((total - available) / total * 1000.0).round() / 10.0
        } else {
            0.0
        };
        Ok(vec![
            ("total", total),
            ("available", available),
            ("percent", percent),
            ("used", self.sys.used_memory() as f64),
            ("free", self.sys.free_memory() as f64),
        ])
    }

    fn disk_io(&mut self) -> io::Result<Vec<Field>> {
        self.disks.refresh(true);
        let (read, written) = self.disks.iter().fold((0u64, 0u64), |(r, w), disk| {
            let usage = disk.usage();
            (
                r.saturating_add(usage.total_read_bytes),
                w.saturating_add(usage.total_written_bytes),
            )
        });
        Ok(vec![("read_bytes", read as f64), ("write_bytes", written as f64)])
    }

    fn available_cpus(&self) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "CPU affinity is not exposed on this platform",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_reports_fixed_field_order() {
        let mut collector = PortableCollector::new();
        let fields = collector.memory().unwrap();
        let names: Vec<_> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["total", "available", "percent", "used", "free"]);
        assert!(fields[0].1 >= 0.0);
    }

    #[test]
    fn disk_reports_byte_counters() {
        let mut collector = PortableCollector::new();
        let names: Vec<_> = collector.disk_io().unwrap().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["read_bytes", "write_bytes"]);
    }

    #[test]
    fn affinity_is_unsupported() {
        let err = PortableCollector::new().available_cpus().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
