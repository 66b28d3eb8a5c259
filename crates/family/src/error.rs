//! Family Style Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A family style error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for family style operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The list of family styles is not a list of objects.
    #[display("malformed family style list")]
    MalformedList,
    /// A record in the list is missing a field, or the field is not a
    /// non-empty string.
    #[display("family style record {index} has an invalid '{field}'")]
    InvalidRecord {
        /// Position of the record in the source list.
        index: usize,
        /// The offending field.
        field: &'static str,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Metadata is either well-formed or it isn't.
        false
    }
}
