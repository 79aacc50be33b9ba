use std::path::PathBuf;

use anyhow::Context;
use chrono_tz::Tz;
use clap::Parser;

use jobstats::logging;
use jobstats::plot::{self, parse_timezone, PlotConfig, Stat, DEFAULT_TIMEZONE};

/// Render a time-series chart from a file written by jobstats-sample.
#[derive(Parser, Debug)]
#[command(name = "jobstats-plot", version, about)]
struct Args {
    /// Reads `<prefix>.txt` and, if present, `<prefix>.markers`.
    #[arg(long = "input_prefix", alias = "input-prefix", default_value = "job_stats")]
    input_prefix: String,

    /// Image to write, `.png` or `.svg` [default: <input_prefix>.png]
    #[arg(long = "output_file", alias = "output-file")]
    output_file: Option<PathBuf>,

    /// Panels to draw, left to right.
    #[arg(long, num_args = 1.., default_values = ["cpu", "mem", "disk"])]
    stats: Vec<Stat>,

    /// IANA zone used for the time axis and markers.
    #[arg(long, default_value = DEFAULT_TIMEZONE, value_parser = parse_timezone)]
    timezone: Tz,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = logging::init();

    let mut config = PlotConfig::new(&args.input_prefix);
    if let Some(output_file) = args.output_file {
        config.output_file = output_file;
    }
    config.stats = args.stats;
    config.timezone = args.timezone;

    plot::run(&config).with_context(|| format!("plotting {}", config.input_prefix))
}
