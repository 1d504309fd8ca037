//! Errors
//!
//! Custom error types used throughout the `arbor` crate.
use crate::value::ValueKind;
use thiserror::Error;

/// Errors that can occur while training or querying a decision tree.
#[derive(Debug, Error)]
pub enum ArborError {
    /// A value was read through the accessor of the other variant.
    #[error("Expected a {expected} value, but found a {found} value.")]
    TypeMismatch { expected: ValueKind, found: ValueKind },
    /// Training was requested on an empty dataset.
    #[error("Unable to train on an empty dataset.")]
    InsufficientData,
    /// The tree was queried before a successful call to train.
    #[error("The tree has not been trained.")]
    NotTrained,
    /// A row disagrees with the schema of the dataset.
    #[error("Row {row} is malformed: {reason}")]
    MalformedRow { row: usize, reason: String },
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Unable to read a model, configuration or data file.
    #[error("Unable to read from {0}")]
    UnableToRead(String),
    /// Unable to write a model or configuration to file.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// A CSV record could not be decoded.
    #[error("Unable to parse csv data: {0}")]
    Csv(String),
}

impl From<csv::Error> for ArborError {
    fn from(e: csv::Error) -> Self {
        ArborError::Csv(e.to_string())
    }
}
