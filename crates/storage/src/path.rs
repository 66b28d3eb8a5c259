//! Relative path validation.
//!
//! Archive entry names and names taken from metadata documents end up joined
//! onto a directory we own. This module makes sure they stay inside it.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Validate a relative path so it can be joined onto a root directory.
///
/// Rejects absolute paths, `..` components anywhere, Windows prefixes, NUL
/// bytes and paths that are empty once `.` components and redundant slashes
/// are removed. Trailing slashes (zip directory entries) are dropped.
///
/// # Returns
/// The normalized path, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use fakit_storage::validate_path;
///
/// assert_eq!(validate_path("css/all.css").unwrap(), Path::new("css/all.css"));
/// assert_eq!(validate_path("./webfonts//").unwrap(), Path::new("webfonts"));
///
/// assert!(validate_path("../outside").is_err());
/// assert!(validate_path("css/../../outside").is_err());
/// assert!(validate_path("/etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in original.components() {
        match component {
            // Null bytes survive Path::components() on Unix but truncate in
            // C-based syscalls.
            Component::Normal(s) if s.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(s) => normalized.push(s),
            Component::CurDir => {},
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => exn::bail!(invalid()),
        }
    }
    if normalized.as_os_str().is_empty() {
        exn::bail!(invalid());
    }
    Ok(normalized)
}

/// Whether `name` is usable as a single file name: one normal component,
/// nothing to normalize away.
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(s)), None) if s == name && !name.contains('\0')
    )
}
