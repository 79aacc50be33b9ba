use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced by the sample file reader, the sampler writer and the
/// chart renderer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed delimited data: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unsupported statistic '{0}' !")]
    UnsupportedStat(String),
    #[error("no statistics requested")]
    NoStats,
    #[error("Negative bytes! ({0})")]
    NegativeBytes(i64),
    #[error("sample file has no column named '{0}'")]
    MissingColumn(String),
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("{} contains no sample rows", .0.display())]
    EmptySampleFile(PathBuf),
    #[error("row has {got} values but the schema has {expected} columns")]
    SchemaMismatch { expected: usize, got: usize },
    #[error("sampling interval must be positive")]
    ZeroInterval,
    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),
    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(f64),
    #[error("unsupported output format '{0}' (expected .png or .svg)")]
    UnsupportedOutput(String),
    #[error("chart rendering failed: {0}")]
    Render(String),
    #[error("rasterizing chart failed: {0}")]
    Rasterize(String),
}

impl Error {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
