//! Directory moves, and swapping a prepared kit into its final location.

use super::error::{ErrorKind, Result};
use exn::ResultExt;
use fakit_storage::error::{ErrorKind as StorageErrorKind, Result as StorageResult};
use fakit_storage::{Filesystem, mkdir_all};
use std::ffi::OsString;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const BACKUP_SUFFIX: &str = ".previous";

/// Move a directory, falling back to copy and delete when `from` and `to`
/// are on different devices.
pub(crate) async fn move_dir(fs: &dyn Filesystem, from: &Path, to: &Path) -> Result<()> {
    let failed = || ErrorKind::DirMove { from: from.to_path_buf(), to: to.to_path_buf() };
    match fs.rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if matches!(e.deref(), StorageErrorKind::CrossDevice(_)) => {
            warn!(
                from = %from.display(),
                to = %to.display(),
                "cannot rename across devices; copying instead, which is not atomic"
            );
            copy_dir(fs, from, to).await.or_raise(failed)?;
            fs.remove_dir_all(from).await.or_raise(failed)
        },
        Err(e) => Err(e).or_raise(failed),
    }
}

/// Recursively copy the contents of `from` into `to`, creating `to`.
async fn copy_dir(fs: &dyn Filesystem, from: &Path, to: &Path) -> StorageResult<()> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    while let Some((source, target)) = pending.pop() {
        mkdir_all(fs, &target).await?;
        for entry in fs.read_dir(&source).await? {
            let Some(name) = entry.path.file_name() else {
                continue;
            };
            let destination = target.join(name);
            if entry.is_dir() {
                pending.push((entry.path, destination));
            } else {
                let data = fs.read(&entry.path).await?;
                fs.write(&destination, &data).await?;
            }
        }
    }
    Ok(())
}

/// `<parent>/<name>.previous`
fn backup_path(destination: &Path) -> Option<PathBuf> {
    let mut name = OsString::from(destination.file_name()?);
    name.push(BACKUP_SUFFIX);
    Some(destination.with_file_name(name))
}

/// Replace whatever is at `destination` with `staging`.
///
/// The old destination is set aside as a sibling backup first, and put back
/// if `staging` cannot be moved into place. A failure while putting it back
/// is only logged.
pub(crate) async fn publish(fs: &dyn Filesystem, staging: &Path, destination: &Path) -> Result<()> {
    let set_aside = |backup: &Path| ErrorKind::DirMove { from: destination.to_path_buf(), to: backup.to_path_buf() };
    let Some(backup) = backup_path(destination) else {
        exn::bail!(ErrorKind::DirMove { from: staging.to_path_buf(), to: destination.to_path_buf() });
    };

    if fs.exists(&backup).await.or_raise(|| set_aside(&backup))? {
        debug!(path = %backup.display(), "removing stale backup");
        fs.remove_dir_all(&backup).await.or_raise(|| set_aside(&backup))?;
    }
    let replacing = fs.exists(destination).await.or_raise(|| set_aside(&backup))?;
    if replacing {
        fs.rename(destination, &backup).await.or_raise(|| set_aside(&backup))?;
    }

    if let Err(e) = move_dir(fs, staging, destination).await {
        if replacing {
            restore(fs, &backup, destination).await;
        }
        return Err(e);
    }
    if replacing && let Err(e) = fs.remove_dir_all(&backup).await {
        warn!(path = %backup.display(), error = ?e, "could not remove backup of previous kit");
    }
    info!(path = %destination.display(), "published kit");
    Ok(())
}

async fn restore(fs: &dyn Filesystem, backup: &Path, destination: &Path) {
    // A cross-device copy may have left a partial destination behind.
    if fs.exists(destination).await.unwrap_or(false)
        && let Err(e) = fs.remove_dir_all(destination).await
    {
        warn!(path = %destination.display(), error = ?e, "could not remove partially published kit");
    }
    match fs.rename(backup, destination).await {
        Ok(()) => debug!(path = %destination.display(), "restored previous kit"),
        Err(e) => warn!(
            backup = %backup.display(),
            destination = %destination.display(),
            error = ?e,
            "could not restore previous kit"
        ),
    }
}
