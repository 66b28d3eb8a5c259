//! Self-Hosting Error Types
//!
//! The top-level kind names the stage that failed; the stage's own error
//! (see [`fetch::error`](crate::fetch::error) and
//! [`prepare::error`](crate::prepare::error)) sits underneath it in the tree.

use derive_more::{Display, Error};

/// A self-hosting error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for self-hosting operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Settings are missing or unusable
    #[display("invalid configuration: {_0}")]
    Configuration(#[error(not(source))] &'static str),
    /// Kit token or build id cannot be used as a directory name
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] &'static str),
    /// Could not look at the existing destination
    #[display("could not inspect destination directory {}", _0.display())]
    Destination(#[error(not(source))] std::path::PathBuf),
    #[display("could not fetch kit metadata")]
    KitMetadata,
    #[display("could not download kit archive")]
    Fetch,
    #[display("could not prepare self-hosted kit")]
    Prepare,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Whether a network stage is worth retrying depends on its cause;
        // walk the error tree for that.
        false
    }
}
