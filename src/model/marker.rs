use std::io;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{Error, Result};

/// A labelled moment during a run, e.g. "job start".
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub label: String,
    pub time: DateTime<Tz>,
}

impl Marker {
    /// Seconds since the epoch, the coordinate the chart uses.
    pub fn epoch_secs(&self) -> f64 {
        self.time.timestamp_micros() as f64 / 1e6
    }
}

#[derive(Debug, Deserialize)]
struct MarkerRecord {
    time: f64,
    label: String,
}

/// Label -> time association read from a `.markers` file.
///
/// A label that appears more than once keeps its first position and takes the
/// last timestamp seen for it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Markers {
    entries: Vec<Marker>,
}

impl Markers {
    /// Parse headerless `epoch_seconds,label` lines.
    pub fn from_reader<R: io::Read>(reader: R, tz: &Tz) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut markers = Markers::default();
        for record in csv.deserialize::<MarkerRecord>() {
            let record = record?;
            let time = to_datetime(record.time, tz)?;
            markers.insert(record.label, time);
        }
        Ok(markers)
    }

    pub fn insert(&mut self, label: String, time: DateTime<Tz>) {
        match self.entries.iter_mut().find(|m| m.label == label) {
            Some(existing) => existing.time = time,
            None => self.entries.push(Marker { label, time }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&Marker> {
        self.entries.iter().find(|m| m.label == label)
    }
}

/// Convert float epoch seconds (UTC) into the display timezone.
pub fn to_datetime(secs: f64, tz: &Tz) -> Result<DateTime<Tz>> {
    if !secs.is_finite() {
        return Err(Error::InvalidTimestamp(secs));
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
        .map(|utc| utc.with_timezone(tz))
        .ok_or(Error::InvalidTimestamp(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_headerless_pairs_in_display_zone() {
        let input = "1700000000,job start\n1700003600,job end\n";
        let markers = Markers::from_reader(input.as_bytes(), &chrono_tz::America::Denver).unwrap();
        assert_eq!(markers.len(), 2);
        let start = markers.get("job start").unwrap();
        // 2023-11-14 22:13:20 UTC is 15:13:20 MST.
        assert_eq!(start.time.hour(), 15);
        assert_eq!(start.epoch_secs(), 1_700_000_000.0);
        assert_eq!(markers.get("job end").unwrap().epoch_secs(), 1_700_003_600.0);
    }

    #[test]
    fn duplicate_label_keeps_first_slot_last_time() {
        let input = "10,a\n20,b\n30,a\n";
        let markers = Markers::from_reader(input.as_bytes(), &Tz::UTC).unwrap();
        let labels: Vec<_> = markers.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["a", "b"]);
        assert_eq!(markers.get("a").unwrap().epoch_secs(), 30.0);
    }

    #[test]
    fn fractional_seconds_survive_conversion() {
        let t = to_datetime(1.25, &Tz::UTC).unwrap();
        assert_eq!(t.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn rejects_non_numeric_time() {
        let input = "soon,job start\n";
        assert!(Markers::from_reader(input.as_bytes(), &Tz::UTC).is_err());
    }
}
