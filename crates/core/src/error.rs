//! Format error model for the flat-file record format.

use thiserror::Error;

/// Result type used across the parsing/aggregation layer.
pub type FormatResult<T> = Result<T, FormatError>;

/// A line (or a value inside a line) did not have the expected shape.
///
/// These are deterministic, input-driven failures. How severe each one is
/// (drop the line vs. discard the box in progress) is decided by the caller;
/// IO and storage failures belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A header line carried the header marker but not exactly two tokens.
    #[error("malformed header line: {line:?}")]
    MalformedHeader { line: String },

    /// A detail line carried the detail marker but not exactly three tokens.
    #[error("malformed content line: {line:?}")]
    MalformedContent { line: String },

    /// The quantity token of a detail line is not a non-negative integer.
    #[error("could not parse quantity: {value:?}")]
    InvalidQuantity { value: String },

    /// An identifier was empty or otherwise unusable.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl FormatError {
    pub fn malformed_header(line: impl Into<String>) -> Self {
        Self::MalformedHeader { line: line.into() }
    }

    pub fn malformed_content(line: impl Into<String>) -> Self {
        Self::MalformedContent { line: line.into() }
    }

    pub fn invalid_quantity(value: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            value: value.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Whether this error invalidates the box currently being assembled.
    ///
    /// Only a broken header does: once a header cannot be trusted, the
    /// lines that follow cannot be attributed to any box.
    pub fn discards_box(&self) -> bool {
        matches!(self, Self::MalformedHeader { .. })
    }
}
