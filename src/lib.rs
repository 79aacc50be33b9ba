//! Jobstats: host resource sampling for batch jobs, and charts of the result.
//!
//! This library exposes the core modules for use by the two binaries and by tests.

pub mod collectors;
pub mod error;
pub mod logging;
pub mod model;
pub mod plot;
pub mod sampler;

pub use error::{Error, Result};
