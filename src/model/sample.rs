use crate::error::{Error, Result};

/// A single named reading from a collector, e.g. `("total", 16e9)`.
pub type Field = (&'static str, f64);

// --- Fixed column names ---

pub const TIME: &str = "time";
pub const CPU_PCT: &str = "cpu_pct";
pub const LOAD_COLUMNS: [&str; 3] = ["load_1", "load_5", "load_15"];
pub const CPU_COUNT_COLUMNS: [&str; 3] = ["n_phys_cpu", "n_log_cpu", "n_avail_cpu"];

/// Ordered column set of a sample file.
///
/// The memory and disk sections vary by host, so they are discovered once at
/// startup and then frozen; every row written afterwards must follow the same
/// layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    memory: Vec<&'static str>,
    disk: Vec<&'static str>,
    columns: Vec<String>,
}

impl Schema {
    pub fn new(memory: Vec<&'static str>, disk: Vec<&'static str>) -> Self {
        let mut columns: Vec<String> = vec![TIME.into(), CPU_PCT.into()];
        columns.extend(memory.iter().map(|c| c.to_string()));
        columns.extend(LOAD_COLUMNS.iter().map(|c| c.to_string()));
        columns.extend(disk.iter().map(|c| c.to_string()));
        columns.extend(CPU_COUNT_COLUMNS.iter().map(|c| c.to_string()));
        Self {
            memory,
            disk,
            columns,
        }
    }

    /// Build a schema from one probe reading of each variable-width metric.
    pub fn probe(memory: &[Field], disk: &[Field]) -> Self {
        Self::new(
            memory.iter().map(|(name, _)| *name).collect(),
            disk.iter().map(|(name, _)| *name).collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn memory_columns(&self) -> &[&'static str] {
        &self.memory
    }

    pub fn disk_columns(&self) -> &[&'static str] {
        &self.disk
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuCounts {
    /// `None` when the platform cannot tell physical cores apart.
    pub physical: Option<usize>,
    pub logical: usize,
    /// Cores this process may be scheduled on.
    pub available: usize,
}

/// One row of a sample file, values in schema order.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRow {
    pub values: Vec<f64>,
}

impl SampleRow {
    /// Assemble a row. Variable-width sections are looked up by name so a
    /// reading that gained or lost a field still lines up with the header;
    /// missing fields become NaN.
    pub fn assemble(
        schema: &Schema,
        time: f64,
        cpu_pct: f64,
        memory: &[Field],
        load: (f64, f64, f64),
        disk: &[Field],
        counts: CpuCounts,
    ) -> Self {
        let mut values = Vec::with_capacity(schema.len());
        values.push(time);
        values.push(cpu_pct);
        values.extend(align(schema.memory_columns(), memory));
        values.extend([load.0, load.1, load.2]);
        values.extend(align(schema.disk_columns(), disk));
        values.push(counts.physical.map_or(f64::NAN, |n| n as f64));
        values.push(counts.logical as f64);
        values.push(counts.available as f64);
        Self { values }
    }

    /// Render the row as strings, refusing rows that do not match the header.
    pub fn to_record(&self, schema: &Schema) -> Result<Vec<String>> {
        if self.values.len() != schema.len() {
            return Err(Error::SchemaMismatch {
                expected: schema.len(),
                got: self.values.len(),
            });
        }
        Ok(self.values.iter().map(|v| v.to_string()).collect())
    }
}

fn align<'a>(names: &'a [&'static str], reading: &'a [Field]) -> impl Iterator<Item = f64> + 'a {
    names.iter().map(move |name| {
        reading
            .iter()
            .find(|(n, _)| n == name)
            .map_or(f64::NAN, |(_, v)| *v)
    })
}
