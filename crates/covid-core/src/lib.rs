//! Core types for covid-series.
//!
//! Record shapes for the national, regional and provincial datasets, the
//! closed metric and field enumerations used to address them, the shared
//! error type, date helpers, delta formatting and CLI settings.

pub mod error;
pub mod fields;
pub mod formatting;
pub mod metrics;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, SeriesError};
