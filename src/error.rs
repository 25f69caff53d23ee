//! Error types for the pagination core

use std::io;
use thiserror::Error;

/// Result type alias for pagecraft operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the caller before pagination begins.
///
/// Overflowing content is not an error: oversized boxes are placed anyway
/// and reported as warnings in the pagination result.
#[derive(Error, Debug)]
pub enum Error {
    /// A measured box violates a data-model invariant.
    #[error("invalid box at {path}: {problem}")]
    InvalidBox { path: String, problem: String },

    /// An option is out of its accepted range.
    #[error("invalid option `{field}`: {problem}")]
    InvalidOptions {
        field: &'static str,
        problem: String,
    },

    /// Malformed JSON input from the host.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error when reading input files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn invalid_box(path: impl Into<String>, problem: impl Into<String>) -> Self {
        Error::InvalidBox {
            path: path.into(),
            problem: problem.into(),
        }
    }

    pub(crate) fn invalid_option(field: &'static str, problem: impl Into<String>) -> Self {
        Error::InvalidOptions {
            field,
            problem: problem.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_box("0/2", "negative height -4");
        assert_eq!(err.to_string(), "invalid box at 0/2: negative height -4");

        let err = Error::invalid_option("content_height", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid option `content_height`: must be positive"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
