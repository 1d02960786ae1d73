//! Log Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading the check log.
///
/// Individual malformed fields are never an error; they are coerced.
#[derive(Debug, Error)]
pub enum LogError {
    /// Log file does not exist
    #[error("Check log not found at '{}'", .0.display())]
    NotFound(PathBuf),

    /// Log file could not be read
    #[error("I/O error reading check log: {0}")]
    Io(#[from] std::io::Error),

    /// Header row lacks a column the evaluator needs
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// CSV stream could not be read at all
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
