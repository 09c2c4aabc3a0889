//! Dataset layer for covid-series.
//!
//! Holds the flat per-granularity datasets, searches them, reconstructs
//! per-entity series, derives daily new cases, ranks the latest reporting
//! day and reads the published files from disk.

pub mod analysis;
pub mod dataset;
pub mod delta;
pub mod extractor;
pub mod lookup;
pub mod notes;
pub mod reader;
pub mod window;

pub use covid_core as core;
