use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};

use jobstats::logging;
use jobstats::sampler::{self, Sampler, SamplerConfig};

/// Periodically sample host CPU, memory, load and disk metrics into a
/// tab-separated file. Runs until interrupted.
#[derive(Parser, Debug)]
#[command(name = "jobstats-sample", version, about)]
struct Args {
    /// Name of the output file to write to (truncated on start).
    #[arg(long = "output_file", alias = "output-file", default_value = "job_stats.txt")]
    output_file: PathBuf,

    /// Seconds between samples.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Stop after this many samples.
    #[arg(long)]
    count: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = logging::init();

    let should_quit = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&should_quit))
            .with_context(|| format!("installing handler for signal {}", signal))?;
    }

    let config = SamplerConfig {
        output_file: args.output_file,
        interval: Duration::from_secs(args.interval),
        count: args.count,
    };

    let result = Sampler::new()
        .context("probing host metrics")
        .and_then(|s| {
            sampler::run(&config, s, should_quit)
                .with_context(|| format!("sampling into {}", config.output_file.display()))
        });

    if let Ok(summary) = &result {
        if summary.interrupted {
            println!("Received interrupt, exiting.");
        }
    }
    println!("Sampling complete.");
    result.map(|_| ())
}
