//! Local filesystem implementation.
//!
//! Accesses the real filesystem using `tokio::fs` for async I/O.

use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::fs::Filesystem;
use async_trait::async_trait;
use std::fs::Metadata;
use std::io::ErrorKind as IoErrorKind;
use std::ops::Deref;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Distinguishes concurrent write probes within one process.
static PROBE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem.
///
/// Every path handed to it must be absolute; relative paths are rejected with
/// [`InvalidPath`](ErrorKind::InvalidPath) rather than being resolved against
/// whatever the working directory happens to be.
///
/// # Examples
///
/// ```no_run
/// use fakit_storage::{Filesystem, LocalFilesystem};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fs = LocalFilesystem::new();
/// let exists = fs.exists(Path::new("/var/www/fontawesome-kit")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalFilesystem {
    _private: (),
}
impl LocalFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn absolute(path: &Path) -> Result<&Path> {
        if !path.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        }
        Ok(path)
    }

    fn info(path: &Path, metadata: &Metadata) -> FileInfo {
        match metadata.is_dir() {
            true => FileInfo::directory(path),
            false => FileInfo::file(path, metadata.len()),
        }
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    fn name(&self) -> &str {
        "local"
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = Self::absolute(path)?;
        let metadata = fs::metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        Ok(Self::info(path, &metadata))
    }

    async fn is_readable(&self, path: &Path) -> Result<bool> {
        let info = match self.stat(path).await {
            Ok(info) => info,
            Err(e) if matches!(e.deref(), ErrorKind::NotFound(_) | ErrorKind::PermissionDenied(_)) => {
                return Ok(false);
            },
            Err(e) => return Err(e),
        };
        // Permission bits don't tell the whole story (ACLs, ownership), so
        // just try it.
        Ok(match info.is_dir() {
            true => fs::read_dir(path).await.is_ok(),
            false => fs::File::open(path).await.is_ok(),
        })
    }

    async fn is_writable(&self, path: &Path) -> Result<bool> {
        let info = match self.stat(path).await {
            Ok(info) => info,
            Err(e) if matches!(e.deref(), ErrorKind::NotFound(_) | ErrorKind::PermissionDenied(_)) => {
                return Ok(false);
            },
            Err(e) => return Err(e),
        };
        // Mode bits say nothing about ownership, so try an actual write.
        let probe = match info.is_dir() {
            true => {
                let id = PROBE_COUNTER.fetch_add(1, Ordering::Relaxed);
                let probe = path.join(format!(".fakit-write-probe-{}-{id}", std::process::id()));
                match OpenOptions::new().write(true).create_new(true).open(&probe).await {
                    Ok(file) => {
                        drop(file);
                        if let Err(e) = fs::remove_file(&probe).await {
                            warn!(path = %probe.display(), error = %e, "could not remove write probe");
                        }
                        Ok(())
                    },
                    Err(e) => Err(e),
                }
            },
            false => OpenOptions::new().write(true).open(path).await.map(drop),
        };
        match probe {
            Ok(()) => Ok(true),
            Err(e) if matches!(e.kind(), IoErrorKind::PermissionDenied | IoErrorKind::ReadOnlyFilesystem) => Ok(false),
            Err(e) => Err(ErrorKind::from_io(e, path).into()),
        }
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        let path = Self::absolute(path)?;
        Ok(fs::create_dir(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<FileInfo>> {
        let path = Self::absolute(path)?;
        let mut entries = fs::read_dir(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        let mut infos = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::from_io(e, path))? {
            let entry_path = entry.path();
            let metadata = entry.metadata().await.map_err(|e| ErrorKind::from_io(e, &entry_path))?;
            infos.push(Self::info(&entry_path, &metadata));
        }
        Ok(infos)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = Self::absolute(path)?;
        Ok(fs::read(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = Self::absolute(path)?;
        Ok(fs::write(path, data).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }

    async fn append(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = Self::absolute(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| ErrorKind::from_io(e, path))?;
        file.write_all(data).await.map_err(|e| ErrorKind::from_io(e, path))?;
        // Tokio files buffer writes in the background; flush so errors
        // surface here instead of being dropped with the handle.
        Ok(file.flush().await.map_err(|e| ErrorKind::from_io(e, path))?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = Self::absolute(from)?;
        let to = Self::absolute(to)?;
        Ok(fs::rename(from, to).await.map_err(|e| match ErrorKind::from_io(e, to) {
            // Source missing is far more likely than the target's parent.
            ErrorKind::NotFound(_) => ErrorKind::NotFound(from.to_path_buf()),
            kind => kind,
        })?)
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let path = Self::absolute(path)?;
        Ok(fs::remove_dir_all(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }
}
