//! Filesystem entry metadata.

use std::path::PathBuf;

/// What kind of entry lives at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Directory,
}

/// Metadata returned by [`Filesystem::stat`](crate::Filesystem::stat) and
/// [`Filesystem::read_dir`](crate::Filesystem::read_dir).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Absolute path of the entry
    pub path: PathBuf,
    pub kind: FileKind,
    /// File size in bytes (zero for directories)
    pub size: u64,
}
impl FileInfo {
    pub fn file(path: impl Into<PathBuf>, size: u64) -> Self {
        Self { path: path.into(), kind: FileKind::File, size }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), kind: FileKind::Directory, size: 0 }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }
}
