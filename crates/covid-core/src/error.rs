use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the covid-series crates.
#[derive(Error, Debug)]
pub enum SeriesError {
    /// No record matched the requested field and value.
    #[error("No record found where {field} = {value}")]
    NotFound { field: String, value: String },

    /// A lookup was given a field the record type does not carry, an
    /// unknown field name, or a value of the wrong type.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A record's report date could not be parsed.
    #[error("Malformed report date: {0}")]
    MalformedDate(String),

    /// A fixed-stride walk was attempted on data whose per-day record count
    /// is not constant.
    #[error("Cardinality violation: {0}")]
    CardinalityViolation(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The advisory-note CSV could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// An advisory-note row has fewer columns than the positional mapping needs.
    #[error("Malformed note on line {line}: expected at least {expected} columns, found {found}")]
    MalformedNote {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A published dataset file was not found under the data directory.
    #[error("Dataset not found: {0}")]
    DatasetNotFound(PathBuf),
}

impl SeriesError {
    /// Build a [`SeriesError::NotFound`] from anything displayable.
    pub fn not_found(field: impl std::fmt::Display, value: impl std::fmt::Display) -> Self {
        SeriesError::NotFound {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Convenience alias used throughout the covid-series crates.
pub type Result<T> = std::result::Result<T, SeriesError>;
