use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{SampleWriter, Sampler};
use crate::error::{Error, Result};

/// Longest uninterrupted sleep, so a stop request is noticed promptly.
const POLL_SLICE: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub struct SamplerConfig {
    pub output_file: PathBuf,
    pub interval: Duration,
    /// Stop after this many rows; `None` runs until interrupted.
    pub count: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: u64,
    pub skipped: u64,
    pub interrupted: bool,
}

/// Write the header, then one row per interval until `should_quit` is set or
/// `count` rows have been written. The file is flushed after every row and
/// closed on every exit path. A zero interval is rejected before the file
/// is touched.
pub fn run(config: &SamplerConfig, mut sampler: Sampler, should_quit: Arc<AtomicBool>) -> Result<RunSummary> {
    if config.interval.is_zero() {
        return Err(Error::ZeroInterval);
    }
    let mut writer = SampleWriter::create(&config.output_file)?;
    writer.write_header(sampler.schema())?;
    info!(
        path = %config.output_file.display(),
        interval_ms = config.interval.as_millis() as u64,
        columns = sampler.schema().len(),
        "sampling started"
    );

    let start = Instant::now();
    let mut tick: u32 = 0;
    let mut skipped = 0;
    let mut interrupted = false;

    loop {
        if should_quit.load(Ordering::Relaxed) {
            interrupted = true;
            break;
        }

        match sampler.sample() {
            Ok(row) => {
                writer.write_row(sampler.schema(), &row)?;
                debug!(rows = writer.rows(), "sample written");
            }
            Err(e) => {
                // Best effort: a missed reading just leaves a gap.
                warn!(error = %e, "reading failed, skipping this interval");
                skipped += 1;
            }
        }

        if config.count.is_some_and(|n| writer.rows() >= n) {
            break;
        }

        tick = next_tick(start, config.interval, tick);
        if !sleep_until(start + config.interval * tick, &should_quit) {
            interrupted = true;
            break;
        }
    }

    let rows = writer.finish()?;
    info!(rows, skipped, interrupted, "sampling stopped");
    Ok(RunSummary {
        rows,
        skipped,
        interrupted,
    })
}

/// Index of the next deadline still in the future. Deadlines are anchored to
/// the start time so the schedule does not drift; ticks missed because a
/// reading ran long are dropped rather than bunched up.
fn next_tick(start: Instant, interval: Duration, tick: u32) -> u32 {
    let elapsed = start.elapsed();
    let mut next = tick + 1;
    while start + interval * next <= start + elapsed {
        next += 1;
    }
    next
}

/// Sleep until `deadline` in short slices. Returns `false` if a stop was
/// requested first.
fn sleep_until(deadline: Instant, should_quit: &AtomicBool) -> bool {
    loop {
        if should_quit.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(POLL_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::fake::FakeCollector;
    use std::fs;

    fn config(dir: &tempfile::TempDir, count: Option<u64>) -> SamplerConfig {
        SamplerConfig {
            output_file: dir.path().join("job_stats.txt"),
            interval: Duration::from_millis(10),
            count,
        }
    }

    #[test]
    fn count_bounds_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, Some(4));
        let sampler = Sampler::with_collector(Box::new(FakeCollector::new())).unwrap();
        let summary = run(&cfg, sampler, Arc::new(AtomicBool::new(false))).unwrap();

        assert_eq!(summary.rows, 4);
        assert!(!summary.interrupted);
        let content = fs::read_to_string(&cfg.output_file).unwrap();
        let widths: Vec<usize> = content.lines().map(|l| l.split('\t').count()).collect();
        assert_eq!(widths.len(), 5);
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn preset_quit_flag_writes_only_header() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, None);
        let sampler = Sampler::with_collector(Box::new(FakeCollector::new())).unwrap();
        let summary = run(&cfg, sampler, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(summary.rows, 0);
        assert!(summary.interrupted);
        assert_eq!(fs::read_to_string(&cfg.output_file).unwrap().lines().count(), 1);
    }

    #[test]
    fn quit_flag_stops_a_sleeping_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&dir, None);
        cfg.interval = Duration::from_secs(3600);
        let sampler = Sampler::with_collector(Box::new(FakeCollector::new())).unwrap();
        let flag = Arc::new(AtomicBool::new(false));

        let stopper = {
            let flag = Arc::clone(&flag);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(200));
                flag.store(true, Ordering::Relaxed);
            })
        };
        let summary = run(&cfg, sampler, flag).unwrap();
        stopper.join().unwrap();

        assert_eq!(summary.rows, 1);
        assert!(summary.interrupted);
    }

    #[test]
    fn failed_readings_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, Some(1));
        let mut collector = FakeCollector::new();
        collector.failing_reads = vec![2];
        let sampler = Sampler::with_collector(Box::new(collector)).unwrap();

        let summary = run(&cfg, sampler, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.skipped, 1);
        let content = fs::read_to_string(&cfg.output_file).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&dir, Some(3));
        cfg.interval = Duration::ZERO;
        let sampler = Sampler::with_collector(Box::new(FakeCollector::new())).unwrap();

        let err = run(&cfg, sampler, Arc::new(AtomicBool::new(false))).unwrap_err();
        assert!(matches!(err, Error::ZeroInterval));
        assert!(!cfg.output_file.exists());
    }

    #[test]
    fn next_tick_skips_missed_deadlines() {
        let start = Instant::now() - Duration::from_millis(350);
        assert_eq!(next_tick(start, Duration::from_millis(100), 0), 4);
        let fresh = Instant::now();
        assert_eq!(next_tick(fresh, Duration::from_secs(60), 0), 1);
    }
}
