use chrono::Offset;
use chrono_tz::Tz;

use crate::error::Result;
use crate::model::to_datetime;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3600.0;
/// Minor subdivisions between two major time ticks.
const TIME_MINOR_DIVISIONS: usize = 4;
const TIME_LABEL_FORMAT: &str = "%m/%d %H:%M:%S";

/// The shared vertical axis: epoch seconds, major ticks on whole hours (or
/// minutes for runs of an hour or less) in the display timezone.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    pub start: f64,
    pub end: f64,
    pub major: Vec<f64>,
    pub minor: Vec<f64>,
    tz: Tz,
}

impl TimeAxis {
    pub fn new(start: f64, end: f64, tz: Tz) -> Result<Self> {
        // A single-row run still needs a non-empty range to draw into.
        let (start, end) = if end > start {
            (start, end)
        } else {
            (start - MINUTE / 2.0, start + MINUTE / 2.0)
        };
        let step = if (end - start) / HOUR > 1.0 { HOUR } else { MINUTE };
        let offset = f64::from(to_datetime(start, &tz)?.offset().fix().local_minus_utc());

        // Align to wall-clock boundaries in the display zone.
        let first = ((start + offset) / step).ceil() * step - offset;
        let minor_step = step / TIME_MINOR_DIVISIONS as f64;

        let mut major = Vec::new();
        let mut minor = Vec::new();
        let mut i = 0usize;
        loop {
            let t = first - step + minor_step * i as f64;
            if t > end {
                break;
            }
            if t >= start {
                if i % TIME_MINOR_DIVISIONS == 0 {
                    major.push(t);
                } else {
                    minor.push(t);
                }
            }
            i += 1;
        }

        Ok(Self {
            start,
            end,
            major,
            minor,
            tz,
        })
    }

    /// Run length in hours.
    pub fn hours(&self) -> f64 {
        (self.end - self.start) / HOUR
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn label(&self, t: f64) -> String {
        to_datetime(t, &self.tz)
            .map(|dt| dt.format(TIME_LABEL_FORMAT).to_string())
            .unwrap_or_default()
    }
}

/// A horizontal value axis with explicit major and minor tick positions.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueAxis {
    pub lo: f64,
    pub hi: f64,
    pub major: Vec<f64>,
    pub minor: Vec<f64>,
}

impl ValueAxis {
    /// Fixed 0..100 with majors every 25 and minors every 5.
    pub fn percent() -> Self {
        Self::with_step(0.0, 100.0, 25.0, 5)
    }

    /// Nice round ticks spanning `lo..hi`.
    pub fn auto(lo: f64, hi: f64) -> Self {
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, lo + 1.0) };
        Self::with_step(lo, hi, nice_step((hi - lo) / 5.0), 5)
    }

    fn with_step(lo: f64, hi: f64, step: f64, divisions: usize) -> Self {
        let minor_step = step / divisions as f64;
        let first = (lo / step).floor() * step;
        let mut major = Vec::new();
        let mut minor = Vec::new();
        let mut i = 0usize;
        loop {
            let v = first + minor_step * i as f64;
            if v > hi + minor_step * 1e-9 {
                break;
            }
            if v >= lo - minor_step * 1e-9 {
                // Snap away float noise so labels read 0.6, not 0.6000000000000001.
                let v = (v / minor_step).round() * minor_step;
                if i % divisions == 0 {
                    major.push(v);
                } else {
                    minor.push(v);
                }
            }
            i += 1;
        }
        Self { lo, hi, major, minor }
    }
}

/// 1, 2 or 5 times a power of ten, at least `raw`.
fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let factor = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_runs_tick_every_minute() {
        // 1700000000 is 22:13:20 UTC.
        let axis = TimeAxis::new(1_700_000_000.0, 1_700_000_300.0, Tz::UTC).unwrap();
        assert_eq!(axis.major.first(), Some(&1_700_000_040.0));
        assert_eq!(axis.major.len(), 5);
        assert!(axis.major.windows(2).all(|w| w[1] - w[0] == 60.0));
        // Three minor ticks between each pair of majors, plus the edges.
        assert!(axis.minor.contains(&1_700_000_055.0));
        assert!(axis.minor.iter().all(|t| axis.contains(*t)));
        assert_eq!(axis.label(1_700_000_040.0), "11/14 22:14:00");
    }

    #[test]
    fn long_runs_tick_on_local_hours() {
        let tz = chrono_tz::America::Denver;
        let start = 1_700_000_000.0;
        let axis = TimeAxis::new(start, start + 3.0 * HOUR, tz).unwrap();
        assert_eq!(axis.major.len(), 3);
        assert_eq!(axis.label(axis.major[0]), "11/14 16:00:00");
        assert!(axis.minor.contains(&(axis.major[0] + 900.0)));
        assert_eq!(axis.hours(), 3.0);
    }

    #[test]
    fn exactly_one_hour_uses_minutes() {
        let axis = TimeAxis::new(0.0, HOUR, Tz::UTC).unwrap();
        assert_eq!(axis.major.len(), 61);
    }

    #[test]
    fn degenerate_span_is_padded() {
        let axis = TimeAxis::new(600.0, 600.0, Tz::UTC).unwrap();
        assert_eq!((axis.start, axis.end), (570.0, 630.0));
        assert_eq!(axis.major, vec![600.0]);
    }

    #[test]
    fn percent_axis_ticks() {
        let axis = ValueAxis::percent();
        assert_eq!(axis.major, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(axis.minor.len(), 16);
        assert!(axis.minor.contains(&5.0));
        assert!(!axis.minor.contains(&25.0));
    }

    #[test]
    fn auto_axis_uses_round_steps() {
        let axis = ValueAxis::auto(-1.0, 13.0);
        assert_eq!(axis.major, vec![0.0, 5.0, 10.0]);
        assert_eq!((axis.lo, axis.hi), (-1.0, 13.0));
        assert_eq!(nice_step(0.3), 0.5);
        assert_eq!(nice_step(0.0), 1.0);
    }
}
