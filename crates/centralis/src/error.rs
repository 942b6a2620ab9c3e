//! Error types for the Centralis library.

use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::FetchError;

/// Main error type for Centralis operations.
#[derive(Debug, Error)]
pub enum CentralisError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pipeline stage needs a field the table does not have.
    #[error("Schema mismatch in stage '{stage}': missing field '{column}'")]
    SchemaMismatch { stage: String, column: String },

    /// A whole-column operation received the wrong number of values.
    #[error("Column '{column}' expects {expected} values, got {actual}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to read.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Table or column name that cannot be used as a SQL identifier.
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credentials file could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A remote payload did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A single remote request failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Every request of a batch fetch failed.
    #[error("All {attempted} fetch requests failed")]
    AllFetchesFailed { attempted: usize },

    /// A fetch worker task panicked or was cancelled.
    #[error("Fetch worker failed: {0}")]
    Worker(String),

    /// Error from the database driver.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type alias for Centralis operations.
pub type Result<T> = std::result::Result<T, CentralisError>;
