use crate::error::{ErrorKind, Result};
use crate::fs::Filesystem;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Recursively create `path` and any missing ancestors.
///
/// Succeeds immediately if `path` is already a directory, and fails with
/// [`NotADirectory`](ErrorKind::NotADirectory) if something else is there.
/// Otherwise walks upwards collecting missing ancestors until an existing
/// directory is found, then creates them top-down. A directory that appears
/// between the scan and its creation (a concurrent caller got there first) is
/// accepted, so calling this twice or concurrently never fails with
/// [`AlreadyExists`](ErrorKind::AlreadyExists).
///
/// # Examples
///
/// ```no_run
/// use fakit_storage::{LocalFilesystem, mkdir_all};
/// use std::path::Path;
///
/// # async fn example() -> fakit_storage::error::Result<()> {
/// let fs = LocalFilesystem::new();
/// mkdir_all(&fs, Path::new("/srv/www/fontawesome-kit/kt-123/build-1")).await?;
/// mkdir_all(&fs, Path::new("/srv/www/fontawesome-kit/kt-123/build-1")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn mkdir_all(fs: &dyn Filesystem, path: &Path) -> Result<()> {
    if let Some(true) = probe(fs, path).await? {
        return Ok(());
    }

    let mut missing: Vec<PathBuf> = vec![path.to_path_buf()];
    let mut current = path;
    loop {
        let Some(parent) = current.parent().filter(|p| !p.as_os_str().is_empty()) else {
            exn::bail!(ErrorKind::NoExistingAncestor(path.to_path_buf()));
        };
        match probe(fs, parent).await? {
            Some(true) => break,
            Some(false) => exn::bail!(ErrorKind::NotADirectory(parent.to_path_buf())),
            None => missing.push(parent.to_path_buf()),
        }
        current = parent;
    }

    for dir in missing.iter().rev() {
        match fs.create_dir(dir).await {
            Ok(()) => debug!(path = %dir.display(), "created directory"),
            Err(e) if matches!(e.deref(), ErrorKind::AlreadyExists(_)) => {
                // Lost a race; only fine if what won is a directory.
                if !fs.is_dir(dir).await? {
                    exn::bail!(ErrorKind::NotADirectory(dir.to_path_buf()));
                }
            },
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// `Some(is_dir)` if something exists at `path`, `None` otherwise.
async fn probe(fs: &dyn Filesystem, path: &Path) -> Result<Option<bool>> {
    match fs.stat(path).await {
        Ok(info) => Ok(Some(info.is_dir())),
        Err(e) if matches!(e.deref(), ErrorKind::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
