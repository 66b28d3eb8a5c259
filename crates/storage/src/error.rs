//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File or directory does not exist
    #[display("not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied (permissions)
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// File or directory already exists (for operations that require new entries)
    #[display("already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// A directory was required, but something else is in the way
    #[display("path is not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// Walked all the way up without finding a directory to create into
    #[display("no existing ancestor directory for: {}", _0.display())]
    NoExistingAncestor(#[error(not(source))] PathBuf),
    /// Target directory exists and has contents
    #[display("directory not empty: {}", _0.display())]
    DirectoryNotEmpty(#[error(not(source))] PathBuf),
    /// Rename cannot be performed atomically because source and target live
    /// on different filesystems
    #[display("cannot rename across devices: {}", _0.display())]
    CrossDevice(#[error(not(source))] PathBuf),
    /// Path is relative, contains invalid characters or escapes its root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Classify an I/O error against the path it happened on.
    pub fn from_io(err: IoError, path: &Path) -> Self {
        use std::io::ErrorKind as Io;
        let path = path.to_path_buf();
        match err.kind() {
            Io::NotFound => Self::NotFound(path),
            Io::PermissionDenied | Io::ReadOnlyFilesystem => Self::PermissionDenied(path),
            Io::AlreadyExists => Self::AlreadyExists(path),
            Io::NotADirectory => Self::NotADirectory(path),
            Io::DirectoryNotEmpty => Self::DirectoryNotEmpty(path),
            Io::CrossesDevices => Self::CrossDevice(path),
            _ => Self::Io(err),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
