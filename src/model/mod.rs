// Re-export all model types from submodules.

pub use marker::{to_datetime, Marker, Markers};
pub use sample::{
    CpuCounts, Field, SampleRow, Schema, CPU_COUNT_COLUMNS, CPU_PCT, LOAD_COLUMNS, TIME,
};

mod marker;
mod sample;
