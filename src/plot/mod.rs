//! Offline chart of a finished sample file.

pub mod axis;
pub mod output;
pub mod render;
pub mod series;
pub mod stat;
pub mod table;

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::Markers;

pub use axis::{TimeAxis, ValueAxis};
pub use output::OutputFormat;
pub use series::{memory_str, CpuTopology, DiskThroughput};
pub use stat::{parse_stats, Stat};
pub use table::{SampleTable, StatFiles};

pub const DEFAULT_TIMEZONE: &str = "America/Denver";

#[derive(Clone, Debug)]
pub struct PlotConfig {
    pub input_prefix: String,
    pub output_file: PathBuf,
    pub stats: Vec<Stat>,
    pub timezone: Tz,
}

impl PlotConfig {
    /// Defaults: all statistics, `<prefix>.png`, the default display zone.
    pub fn new(input_prefix: &str) -> Self {
        Self {
            input_prefix: input_prefix.to_string(),
            output_file: PathBuf::from(format!("{}.png", input_prefix)),
            stats: Stat::ALL.to_vec(),
            timezone: chrono_tz::America::Denver,
        }
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::InvalidTimezone(name.to_string()))
}

/// Read `<prefix>.txt` and, when it exists, `<prefix>.markers`.
pub fn read_stat_files(prefix: &str, tz: &Tz) -> Result<(SampleTable, Option<Markers>)> {
    let files = StatFiles::from_prefix(prefix);
    let table = SampleTable::read(&files.samples)?;

    let markers = if files.markers.exists() {
        let file = File::open(&files.markers).map_err(|e| Error::io(&files.markers, e))?;
        let markers = Markers::from_reader(file, tz)?;
        debug!(count = markers.len(), "read markers");
        Some(markers)
    } else {
        debug!(path = %files.markers.display(), "no marker file");
        None
    };
    Ok((table, markers))
}

/// Render one panel per statistic and save the image. The output format is
/// checked before anything is drawn.
pub fn make_plot(
    table: &SampleTable,
    markers: Option<&Markers>,
    stats: &[Stat],
    tz: Tz,
    output: &Path,
) -> Result<()> {
    let format = OutputFormat::from_path(output)?;
    let (start, end) = table.time_span()?;
    let axis = TimeAxis::new(start, end, tz)?;
    let svg = render::render_svg(table, markers, stats, &axis)?;
    output::save(&svg, output, format)
}

/// Read the sample files named by `config` and write the chart.
pub fn run(config: &PlotConfig) -> Result<()> {
    info!(prefix = %config.input_prefix, "reading stats");
    let (table, markers) = read_stat_files(&config.input_prefix, &config.timezone)?;

    info!(rows = table.len(), stats = config.stats.len(), "generating figure");
    make_plot(
        &table,
        markers.as_ref(),
        &config.stats,
        config.timezone,
        &config.output_file,
    )?;
    info!(path = %config.output_file.display(), "chart written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_follow_prefix() {
        let config = PlotConfig::new("runs/job_stats");
        assert_eq!(config.output_file, PathBuf::from("runs/job_stats.png"));
        assert_eq!(config.stats, Stat::ALL.to_vec());
        assert_eq!(config.timezone.name(), DEFAULT_TIMEZONE);
    }

    #[test]
    fn timezone_names_are_validated() {
        assert_eq!(parse_timezone("UTC").unwrap(), Tz::UTC);
        assert!(matches!(parse_timezone("Mars/Olympus"), Err(Error::InvalidTimezone(_))));
    }

    #[test]
    fn missing_sample_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let err = read_stat_files(prefix.to_str().unwrap(), &Tz::UTC).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
