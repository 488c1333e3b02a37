use std::{collections::TryReserveError, path::PathBuf};
use thiserror::Error;

/// Errors that stop the run. Every one of them maps to exit code 1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),
    #[error("could not open file '{}': {source}", path.display())]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("memory allocation failed: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error("Failed to load demographic data from '{}'.", path.display())]
    NoEntries { path: PathBuf },
    #[error("error reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors local to a single line of the operations file. They are reported
/// and the line is skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("Invalid filter format at line {line}: '{text}'")]
    Syntax { line: usize, text: String },
    #[error("unsupported operation '{0}' in filter field.")]
    UnknownOperator(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("invalid state code '{0}', expected 2 characters")]
    InvalidStateCode(String),
    #[error("Unsupported operation at line {line}: '{text}'")]
    Unsupported { line: usize, text: String },
    #[error("Invalid UTF-8 at line {0}")]
    InvalidText(usize),
    #[error("arithmetic overflow computing {0}")]
    Overflow(String),
}

/// Reasons a single demographics row is dropped during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowParseError {
    #[error("missing column {0}")]
    MissingColumn(usize),
    #[error("column {column}: '{value}' is not a number")]
    InvalidNumber { column: usize, value: String },
    #[error("county name longer than {0} characters")]
    NameTooLong(usize),
    #[error("state code '{0}' is not 2 characters")]
    InvalidStateCode(String),
}
