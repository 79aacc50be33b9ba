use crate::error::{Error, Result};
use crate::plot::table::SampleTable;

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human readable byte count using powers of 1000: the largest unit whose
/// value is at least one, to one decimal place.
pub fn memory_str(n_bytes: i64) -> Result<String> {
    if n_bytes < 0 {
        return Err(Error::NegativeBytes(n_bytes));
    }
    let mut unit = 0;
    let mut scale: i64 = 1;
    while unit + 1 < BYTE_UNITS.len() && n_bytes / scale >= 1000 {
        scale *= 1000;
        unit += 1;
    }
    Ok(format!("{:.1}{}", n_bytes as f64 / scale as f64, BYTE_UNITS[unit]))
}

/// Per-interval disk throughput in MB/s.
///
/// Each point is the first difference of a cumulative byte counter over the
/// first difference of the timestamps, placed at the interval midpoint, so
/// there is one point fewer than there are rows. Intervals with a zero or
/// negative time step come out non-finite and are left for the renderer to
/// skip.
#[derive(Clone, Debug, PartialEq)]
pub struct DiskThroughput {
    pub times: Vec<f64>,
    pub read: Vec<f64>,
    pub write: Vec<f64>,
}

impl DiskThroughput {
    pub fn from_table(table: &SampleTable) -> Result<Self> {
        let times = table.times()?;
        let read = rate(times, table.column("read_bytes")?);
        let write = rate(times, table.column("write_bytes")?);
        let times = times.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
        Ok(Self { times, read, write })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Largest finite rate across both series, if any.
    pub fn max(&self) -> Option<f64> {
        self.read
            .iter()
            .chain(&self.write)
            .copied()
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }
}

fn rate(times: &[f64], bytes: &[f64]) -> Vec<f64> {
    times
        .windows(2)
        .zip(bytes.windows(2))
        .map(|(t, b)| {
            let dt = t[1] - t[0];
            if dt > 0.0 {
                (b[1] - b[0]) / (dt * 1e6)
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Pair values with times, dropping points that cannot be drawn.
pub fn finite_points(values: &[f64], times: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .zip(times)
        .filter(|(v, t)| v.is_finite() && t.is_finite())
        .map(|(v, t)| (*v, *t))
        .collect()
}

/// Core counts recorded in the first row, assumed constant for the run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CpuTopology {
    pub physical: f64,
    pub logical: f64,
    pub available: f64,
}

impl CpuTopology {
    pub fn from_table(table: &SampleTable) -> Result<Self> {
        Ok(Self {
            physical: table.first("n_phys_cpu")?,
            logical: table.first("n_log_cpu")?,
            available: table.first("n_avail_cpu")?,
        })
    }

    /// CPU% at which every core available to the sampled process is busy,
    /// when that is fewer than all logical cores.
    pub fn available_boundary(&self) -> Option<f64> {
        let restricted = self.available.is_finite()
            && self.logical.is_finite()
            && self.logical > 0.0
            && self.available != self.logical;
        restricted.then(|| self.available / self.logical * 100.0)
    }

    /// Second line of the CPU panel title.
    pub fn counts_label(&self) -> String {
        format!(
            "({} Physical CPUs, {} Logical CPUs, {} Available CPUs)",
            count_str(self.physical),
            count_str(self.logical),
            count_str(self.available)
        )
    }
}

fn count_str(n: f64) -> String {
    if n.is_finite() {
        format!("{}", n as i64)
    } else {
        "?".to_string()
    }
}
