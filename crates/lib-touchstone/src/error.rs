//! Error types for Touchstone parsing and validation.

use thiserror::Error;

/// Malformed Touchstone input. Fatal to the parse.
///
/// Line numbers are 1-based and refer to the raw file content.
#[derive(Debug, Error)]
pub enum FormatError {
    /// I/O error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file contains no data lines.
    #[error("No data lines found in Touchstone content")]
    NoDataLines,

    /// The first data line does not describe a square S-matrix.
    #[error("Line {line}: {values} S-parameter values do not form a square port matrix")]
    NonSquarePortCount { line: usize, values: usize },

    /// A data line has a different value count than the first one.
    #[error("Line {line}: expected {expected} S-parameter values, got {actual}")]
    RaggedRow {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A token on a data line is not a number.
    #[error("Line {line}: invalid numeric value '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// Parsed points could not be assembled into a dataset.
    #[error("Inconsistent dataset: {0}")]
    Inconsistent(&'static str),

    /// The `#` option line could not be understood.
    #[error("Line {line}: bad option line: {message}")]
    BadHeader { line: usize, message: String },
}

impl FormatError {
    /// Line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::NonSquarePortCount { line, .. }
            | Self::RaggedRow { line, .. }
            | Self::InvalidNumber { line, .. }
            | Self::BadHeader { line, .. } => Some(*line),
            Self::Io(_) | Self::NoDataLines | Self::Inconsistent(_) => None,
        }
    }

    pub(crate) fn bad_header(line: usize, message: impl Into<String>) -> Self {
        Self::BadHeader {
            line,
            message: message.into(),
        }
    }
}

/// Parseable but physically inconsistent data.
///
/// Callers decide whether to proceed with a warning or abort; the dataset
/// itself is never modified.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("S-parameter validation failed: {}", errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// Convert nom errors to a header error on a given line.
pub(crate) fn header_error_from_nom(
    line: usize,
    err: nom::Err<nom::error::Error<&str>>,
) -> FormatError {
    match err {
        nom::Err::Incomplete(_) => FormatError::bad_header(line, "incomplete option line"),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let preview: String = e.input.chars().take(20).collect();
            FormatError::bad_header(line, format!("unrecognized token at '{}'", preview.trim()))
        }
    }
}
