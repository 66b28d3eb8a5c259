//! Download a READY build's archive into a fresh temporary directory.

pub mod error;

use self::error::{ErrorKind, Result};
use exn::ResultExt;
use fakit_api::KitBuild;
use fakit_api::transport::{HttpRequest, TransportHandle};
use fakit_storage::error::ErrorKind as StorageErrorKind;
use fakit_storage::{FsHandle, mkdir_all};
use futures::StreamExt;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Name of the downloaded archive inside the temporary directory.
pub const ARCHIVE_FILE_NAME: &str = "kit.zip";

const TEMP_DIR_PREFIX: &str = "fakit-";
const TEMP_DIR_SUFFIX_LEN: usize = 16;
const TEMP_DIR_ATTEMPTS: usize = 8;

pub struct ArchiveFetcher {
    fs: FsHandle,
    transport: TransportHandle,
    temp_root: PathBuf,
    timeout: Duration,
}
impl ArchiveFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Temporary directories are created under `temp_root`, which is itself
    /// created if missing.
    pub fn new(fs: FsHandle, transport: TransportHandle, temp_root: impl Into<PathBuf>) -> Self {
        Self { fs, transport, temp_root: temp_root.into(), timeout: Self::DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Download `build` to `<temp dir>/kit.zip` and return the temp dir.
    ///
    /// The caller owns the returned directory and is responsible for
    /// removing it. If the download fails the directory is removed here.
    #[instrument(skip_all, fields(build_id = %build.build_id(), temp_root = %self.temp_root.display()))]
    pub async fn fetch(&self, build: &KitBuild) -> Result<PathBuf> {
        let Some(url) = build.url() else {
            exn::bail!(ErrorKind::NotReady(build.status()));
        };
        let temp_dir = self.create_temp_dir().await?;
        match self.download(url, &temp_dir).await {
            Ok(bytes) => {
                info!(bytes, path = %temp_dir.display(), "downloaded kit archive");
                Ok(temp_dir)
            },
            Err(e) => {
                if let Err(cleanup) = self.fs.remove_dir_all(&temp_dir).await {
                    warn!(path = %temp_dir.display(), error = ?cleanup, "could not remove temporary directory");
                }
                Err(e)
            },
        }
    }

    async fn create_temp_dir(&self) -> Result<PathBuf> {
        let root = &self.temp_root;
        mkdir_all(&*self.fs, root).await.or_raise(|| ErrorKind::TempDirCreation(root.clone()))?;
        let writable = self.fs.is_writable(root).await.or_raise(|| ErrorKind::TempDirCreation(root.clone()))?;
        if !writable {
            exn::bail!(ErrorKind::TempDirNotWritable(root.clone()));
        }
        let mut attempt = 1;
        loop {
            let dir = root.join(temp_dir_name());
            match self.fs.create_dir(&dir).await {
                Ok(()) => {
                    debug!(path = %dir.display(), "created temporary directory");
                    return Ok(dir);
                },
                Err(e) if matches!(e.deref(), StorageErrorKind::AlreadyExists(_)) && attempt < TEMP_DIR_ATTEMPTS => {
                    attempt += 1;
                },
                Err(e) if matches!(e.deref(), StorageErrorKind::PermissionDenied(_)) => {
                    return Err(e).or_raise(|| ErrorKind::TempDirNotWritable(root.clone()));
                },
                Err(e) => return Err(e).or_raise(|| ErrorKind::TempDirCreation(root.clone())),
            }
        }
    }

    /// Stream the body to disk chunk by chunk and return its size.
    async fn download(&self, url: &str, temp_dir: &Path) -> Result<u64> {
        let archive = temp_dir.join(ARCHIVE_FILE_NAME);
        let request = HttpRequest::get(url).timeout(self.timeout);
        let response = self.transport.stream(request).await.or_raise(|| ErrorKind::DownloadTransport)?;
        if response.status != 200 {
            exn::bail!(ErrorKind::DownloadHttpStatus(response.status));
        }
        self.fs.write(&archive, &[]).await.or_raise(|| ErrorKind::DownloadWrite(archive.clone()))?;
        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.or_raise(|| ErrorKind::DownloadTransport)?;
            self.fs
                .append(&archive, &chunk)
                .await
                .or_raise(|| ErrorKind::DownloadWrite(archive.clone()))?;
        }
        match self.fs.stat(&archive).await {
            Ok(info) if info.is_file() && info.size > 0 => Ok(info.size),
            Ok(_) => exn::bail!(ErrorKind::DownloadedArchiveInvalid(archive)),
            Err(e) => Err(e).or_raise(|| ErrorKind::DownloadedArchiveInvalid(archive)),
        }
    }
}
impl fmt::Debug for ArchiveFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveFetcher")
            .field("fs", &self.fs.name())
            .field("transport", &self.transport.name())
            .field("temp_root", &self.temp_root)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn temp_dir_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_DIR_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{TEMP_DIR_PREFIX}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakit_api::BuildStatus;
    use fakit_api::transport::{ErrorKind as TransportErrorKind, MockTransport};
    use fakit_storage::{Filesystem, LocalFilesystem, MockFilesystem};
    use std::sync::Arc;

    const URL: &str = "https://cdn.test/kit.zip";

    fn ready() -> KitBuild {
        KitBuild::new("kt-1", "b-1", BuildStatus::Ready, Some(URL.to_string())).unwrap()
    }

    fn fetcher(fs: &Arc<MockFilesystem>, transport: &Arc<MockTransport>) -> ArchiveFetcher {
        ArchiveFetcher::new(fs.clone(), transport.clone(), "/tmp/fakit")
    }

    async fn children(fs: &MockFilesystem, path: &str) -> usize {
        fs.read_dir(Path::new(path)).await.unwrap().len()
    }

    #[tokio::test]
    async fn test_fetch_streams_to_temp_dir() {
        let fs = Arc::new(MockFilesystem::default());
        let transport = Arc::new(MockTransport::new().with_response(200, "PK-archive-bytes").with_chunk_size(3));
        let temp_dir = fetcher(&fs, &transport)
            .with_timeout(Duration::from_secs(5))
            .fetch(&ready())
            .await
            .unwrap();

        assert_eq!(temp_dir.parent(), Some(Path::new("/tmp/fakit")));
        let name = temp_dir.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("fakit-"));
        assert_eq!(name.len(), TEMP_DIR_PREFIX.len() + TEMP_DIR_SUFFIX_LEN);
        assert_eq!(fs.read(&temp_dir.join("kit.zip")).await.unwrap(), b"PK-archive-bytes");

        let requests = transport.requests().await;
        assert_eq!(requests[0].url, URL);
        assert_eq!(requests[0].timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_get_distinct_dirs() {
        let fs = Arc::new(MockFilesystem::default());
        let transport = Arc::new(MockTransport::new().with_response(200, "one").with_response(200, "two"));
        let fetcher = fetcher(&fs, &transport);
        let build = ready();
        let (first, second) = tokio::join!(fetcher.fetch(&build), fetcher.fetch(&build));
        assert_ne!(first.unwrap(), second.unwrap());
        assert_eq!(children(&fs, "/tmp/fakit").await, 2);
    }

    #[tokio::test]
    async fn test_not_ready() {
        let fs = Arc::new(MockFilesystem::default());
        let transport = Arc::new(MockTransport::new());
        let pending = KitBuild::new("kt-1", "b-1", BuildStatus::Pending, None).unwrap();
        let err = fetcher(&fs, &transport).fetch(&pending).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotReady(BuildStatus::Pending));
        assert!(transport.requests().await.is_empty());
        assert!(!fs.exists(Path::new("/tmp/fakit")).await.unwrap());
    }

    #[tokio::test]
    async fn test_http_status_removes_temp_dir() {
        let fs = Arc::new(MockFilesystem::default());
        let transport = Arc::new(MockTransport::new().with_response(404, "gone"));
        let err = fetcher(&fs, &transport).fetch(&ready()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::DownloadHttpStatus(404));
        assert!(!err.is_retryable());
        assert_eq!(children(&fs, "/tmp/fakit").await, 0);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let fs = Arc::new(MockFilesystem::default());
        let transport = Arc::new(MockTransport::new().with_failure(TransportErrorKind::Timeout));
        let err = fetcher(&fs, &transport).fetch(&ready()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::DownloadTransport);
        assert!(err.is_retryable());
        assert_eq!(children(&fs, "/tmp/fakit").await, 0);
    }

    #[tokio::test]
    async fn test_empty_body_is_invalid() {
        let fs = Arc::new(MockFilesystem::default());
        let transport = Arc::new(MockTransport::new().with_response(200, ""));
        let err = fetcher(&fs, &transport).fetch(&ready()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::DownloadedArchiveInvalid(path) if path.ends_with("kit.zip")));
        assert_eq!(children(&fs, "/tmp/fakit").await, 0);
    }

    #[tokio::test]
    async fn test_temp_root_not_writable() {
        let fs = Arc::new(MockFilesystem::default().with_dirs(["/tmp/fakit"]).with_read_only("/tmp/fakit"));
        let transport = Arc::new(MockTransport::new());
        let err = fetcher(&fs, &transport).fetch(&ready()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::TempDirNotWritable(PathBuf::from("/tmp/fakit")));
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_temp_root_is_a_file() {
        let fs = Arc::new(MockFilesystem::with_files([("/tmp/fakit", b"file")]));
        let transport = Arc::new(MockTransport::new());
        let err = fetcher(&fs, &transport).fetch(&ready()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::TempDirCreation(PathBuf::from("/tmp/fakit")));
    }

    #[tokio::test]
    async fn test_fetch_to_local_disk() {
        let root = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new().with_response(200, vec![7u8; 4096]).with_chunk_size(1000));
        let fetcher = ArchiveFetcher::new(Arc::new(LocalFilesystem::new()), transport, root.path().join("downloads"));
        let temp_dir = fetcher.fetch(&ready()).await.unwrap();
        assert_eq!(std::fs::read(temp_dir.join("kit.zip")).unwrap(), vec![7u8; 4096]);
    }
}
