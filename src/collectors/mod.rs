use std::io;

use crate::model::Field;

pub mod linux;
pub mod portable;

/// Trait for OS-specific metric collection.
/// Implementations (LinuxCollector, PortableCollector) decide which memory and
/// disk fields the host can report; the sampler freezes that set into the
/// file header after the first reading.
pub trait MetricsCollector {
    /// Virtual memory breakdown, in bytes except for `percent`.
    fn memory(&mut self) -> io::Result<Vec<Field>>;

    /// Cumulative disk I/O counters summed over all physical devices.
    fn disk_io(&mut self) -> io::Result<Vec<Field>>;

    /// Number of cores the current process may be scheduled on.
    /// Platforms without an affinity query return `ErrorKind::Unsupported`.
    fn available_cpus(&self) -> io::Result<usize>;
}

/// Collector suited to the host this binary was built for.
pub fn default_collector() -> Box<dyn MetricsCollector> {
    if cfg!(target_os = "linux") {
        Box::new(linux::LinuxCollector::new())
    } else {
        Box::new(portable::PortableCollector::new())
    }
}
