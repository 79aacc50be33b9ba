//! Host metric sampling: schema probing, one reading per tick, TSV output.

mod run;
mod writer;

use std::io;
use std::thread;
use std::time::Instant;

use chrono::Utc;
use sysinfo::{CpuRefreshKind, MINIMUM_CPU_UPDATE_INTERVAL, RefreshKind, System};
use tracing::{debug, warn};

use crate::collectors::{default_collector, MetricsCollector};
use crate::model::{CpuCounts, SampleRow, Schema};

pub use run::{run, RunSummary, SamplerConfig};
pub use writer::SampleWriter;

pub struct Sampler {
    sys: System,
    cpu_refreshed: Instant,
    collector: Box<dyn MetricsCollector>,
    schema: Schema,
    cpu_counts: CpuCounts,
}

impl Sampler {
    pub fn new() -> io::Result<Self> {
        Self::with_collector(default_collector())
    }

    /// Probe the collector once to fix the file schema, and read the CPU
    /// topology, which is assumed constant for the whole run.
    pub fn with_collector(mut collector: Box<dyn MetricsCollector>) -> io::Result<Self> {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        // Baseline for the first CPU% delta.
        sys.refresh_cpu_usage();
        let cpu_refreshed = Instant::now();

        let schema = Schema::probe(&collector.memory()?, &collector.disk_io()?);
        debug!(columns = schema.len(), "probed sample schema");

        let cpu_counts = probe_cpu_counts(&sys, collector.as_ref());
        Ok(Self {
            sys,
            cpu_refreshed,
            collector,
            schema,
            cpu_counts,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn cpu_counts(&self) -> CpuCounts {
        self.cpu_counts
    }

    /// Take one timestamped reading of every metric.
    ///
    /// CPU% is measured since the previous refresh; if that was less than
    /// sysinfo's minimum update interval ago (the first reading, or very
    /// short intervals), this blocks for the remainder.
    pub fn sample(&mut self) -> io::Result<SampleRow> {
        let since = self.cpu_refreshed.elapsed();
        if since < MINIMUM_CPU_UPDATE_INTERVAL {
            thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL - since);
        }

        let now = Utc::now();
        let time = now.timestamp_micros() as f64 / 1e6;

        self.sys.refresh_cpu_usage();
        self.cpu_refreshed = Instant::now();
        let cpu_pct = f64::from(self.sys.global_cpu_usage());
        let memory = self.collector.memory()?;
        let load = System::load_average();
        let disk = self.collector.disk_io()?;

        Ok(SampleRow::assemble(
            &self.schema,
            time,
            (cpu_pct * 10.0).round() / 10.0,
            &memory,
            (load.one, load.five, load.fifteen),
            &disk,
            self.cpu_counts,
        ))
    }
}

/// Physical and logical counts come from sysinfo; the available count from
/// the collector's affinity query, falling back to the logical count.
pub fn probe_cpu_counts(sys: &System, collector: &dyn MetricsCollector) -> CpuCounts {
    let logical = match sys.cpus().len() {
        0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
        n => n,
    };
    let available = match collector.available_cpus() {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "CPU affinity stats not available, falling back to # of logical cores");
            logical
        }
    };
    CpuCounts {
        physical: System::physical_core_count(),
        logical,
        available,
    }
}
