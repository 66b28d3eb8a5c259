//! Filesystem trait and implementations.
//!
//! This module defines the [`Filesystem`] trait, the capability every
//! component that touches disk receives explicitly, so that tests can swap
//! the local filesystem for an in-memory one.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalFilesystem;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockFilesystem;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use async_trait::async_trait;
use std::ops::Deref;
use std::path::Path;

/// Unified interface for filesystem operations.
///
/// All paths are absolute. Operations are asynchronous; implementations
/// backed by blocking syscalls hand them off to a blocking pool.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use fakit_storage::{Filesystem, error::Result};
///
/// async fn size_or_zero(fs: &dyn Filesystem) -> Result<u64> {
///     let path = Path::new("/var/lib/kit.zip");
///     if fs.exists(path).await? {
///         Ok(fs.stat(path).await?.size)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Name of the filesystem implementation (used for logging only).
    fn name(&self) -> &str;

    /// Get entry metadata without reading contents.
    ///
    /// Returns [`NotFound`](ErrorKind::NotFound) if nothing exists at `path`.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;

    /// Check whether anything (file or directory) exists at `path`.
    async fn exists(&self, path: &Path) -> Result<bool> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.deref(), ErrorKind::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check whether `path` exists and is a directory.
    async fn is_dir(&self, path: &Path) -> Result<bool> {
        match self.stat(path).await {
            Ok(info) => Ok(info.is_dir()),
            Err(e) if matches!(e.deref(), ErrorKind::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether the current process can read `path` (list it, for directories).
    /// Missing paths are not readable.
    async fn is_readable(&self, path: &Path) -> Result<bool>;

    /// Whether the current process can write to `path` (create entries in
    /// it, for directories). Missing paths are not writable.
    async fn is_writable(&self, path: &Path) -> Result<bool>;

    /// Create a single directory.
    ///
    /// Returns [`AlreadyExists`](ErrorKind::AlreadyExists) if anything is
    /// already at `path` and [`NotFound`](ErrorKind::NotFound) if the parent
    /// is missing. See [`mkdir_all`](crate::mkdir_all) for the recursive,
    /// race-tolerant version.
    async fn create_dir(&self, path: &Path) -> Result<()>;

    /// List the direct children of a directory (in no particular order).
    async fn read_dir(&self, path: &Path) -> Result<Vec<FileInfo>>;

    /// Read file contents.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or truncate a file and write `data` to it.
    ///
    /// The parent directory must already exist.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Append `data` to a file, creating it if it doesn't exist.
    ///
    /// Intended for streaming downloads chunk by chunk.
    async fn append(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Rename/move a file or directory.
    ///
    /// # Notes
    /// - A directory may replace an existing *empty* directory; a non-empty
    ///   target yields [`DirectoryNotEmpty`](ErrorKind::DirectoryNotEmpty).
    /// - Returns [`CrossDevice`](ErrorKind::CrossDevice) when `from` and
    ///   `to` are on different filesystems. Nothing is moved in that case.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Recursively delete a directory and everything in it.
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;
}
