use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{SampleRow, Schema};

/// Tab-separated sample file, flushed after every row so a reader never sees
/// a half-written line while the sampler sleeps.
pub struct SampleWriter {
    path: PathBuf,
    csv: csv::Writer<File>,
    rows: u64,
}

impl SampleWriter {
    /// Create (or truncate) the output file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let csv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        Ok(Self {
            path: path.to_path_buf(),
            csv,
            rows: 0,
        })
    }

    pub fn write_header(&mut self, schema: &Schema) -> Result<()> {
        self.csv.write_record(schema.columns())?;
        self.flush()
    }

    pub fn write_row(&mut self, schema: &Schema, row: &SampleRow) -> Result<()> {
        let record = row.to_record(schema)?;
        self.csv.write_record(&record)?;
        self.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and sync, closing the file.
    pub fn finish(self) -> Result<u64> {
        let path = self.path;
        let file = self
            .csv
            .into_inner()
            .map_err(|e| Error::io(&path, e.into_error()))?;
        file.sync_all().map_err(|e| Error::io(&path, e))?;
        Ok(self.rows)
    }

    fn flush(&mut self) -> Result<()> {
        self.csv.flush().map_err(|e| Error::io(&self.path, e))
    }
}
