use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::TIME;

/// Sample file held column-wise, addressed by header name.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleTable {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SampleTable {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let table = Self::from_reader(file)?;
        if table.is_empty() {
            return Err(Error::EmptySampleFile(path.to_path_buf()));
        }
        Ok(table)
    }

    /// Parse tab-separated rows under a header line. Every row must have as
    /// many fields as the header.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv.headers()?.iter().map(String::from).collect();
        let mut columns = vec![Vec::new(); headers.len()];
        for (row, record) in csv.records().enumerate() {
            let record = record?;
            for ((column, name), field) in columns.iter_mut().zip(&headers).zip(record.iter()) {
                let value = parse_value(field).ok_or_else(|| Error::InvalidValue {
                    row: row + 1,
                    column: name.clone(),
                    value: field.to_string(),
                })?;
                column.push(value);
            }
        }
        Ok(Self { headers, columns })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// First value of a column; used for figures that are constant for a run.
    pub fn first(&self, name: &str) -> Result<f64> {
        self.column(name)?
            .first()
            .copied()
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// The `time` column, seconds since the epoch.
    pub fn times(&self) -> Result<&[f64]> {
        self.column(TIME)
    }

    /// First and last timestamp.
    pub fn time_span(&self) -> Result<(f64, f64)> {
        let times = self.times()?;
        let lo = times.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !lo.is_finite() || !hi.is_finite() {
            return Err(Error::InvalidTimestamp(lo));
        }
        Ok((lo, hi))
    }
}

/// Numbers as written by the sampler, plus the empty and `None` spellings
/// other writers use for a missing value.
fn parse_value(field: &str) -> Option<f64> {
    let field = field.trim();
    match field {
        "" | "None" | "nan" | "NaN" => Some(f64::NAN),
        _ => field.parse().ok(),
    }
}

/// `<prefix>.txt` and `<prefix>.markers`.
#[derive(Clone, Debug, PartialEq)]
pub struct StatFiles {
    pub samples: PathBuf,
    pub markers: PathBuf,
}

impl StatFiles {
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            samples: PathBuf::from(format!("{}.txt", prefix)),
            markers: PathBuf::from(format!("{}.markers", prefix)),
        }
    }
}
