//! Error types for machine construction and parsing

use thiserror::Error;

/// Result type alias for machine operations
pub type Result<T> = std::result::Result<T, SpinnMachineError>;

/// Errors that can occur while building or validating a machine
#[derive(Debug, Error)]
pub enum SpinnMachineError {
    /// An item was added twice to a container that holds one of each
    #[error("{item} {value} already exists")]
    AlreadyExists {
        /// Kind of item (chip, link, processor, ...)
        item: String,
        /// Identity of the offending item
        value: String,
    },

    /// A parameter was outside its allowed range
    #[error("invalid {parameter} {value}: {problem}")]
    InvalidParameter {
        /// Name of the parameter
        parameter: String,
        /// Value supplied
        value: String,
        /// What was wrong with it
        problem: String,
    },

    /// The machine as a whole fails an invariant
    #[error("invalid machine: {reason}")]
    InvalidMachine {
        /// Reason for failure
        reason: String,
    },

    /// Configuration or ignore-string text could not be parsed
    #[error("parse error: {reason}")]
    ParseError {
        /// Reason for failure
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON error
    #[error("JSON error: {source}")]
    Json {
        /// Underlying serde error
        #[from]
        source: serde_json::Error,
    },
}

impl SpinnMachineError {
    /// Create an already-exists error
    pub fn already_exists(item: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AlreadyExists {
            item: item.into(),
            value: value.into(),
        }
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            problem: problem.into(),
        }
    }

    /// Create an invalid-machine error
    pub fn invalid_machine(reason: impl Into<String>) -> Self {
        Self::InvalidMachine {
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }
}
