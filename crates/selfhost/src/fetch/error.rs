//! Error types for the [`fetch`](super) module.

use derive_more::{Display, Error};
use fakit_api::BuildStatus;
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Build has no download yet; poll it until it is READY
    #[display("kit build is not ready (status {_0})")]
    NotReady(#[error(not(source))] BuildStatus),
    #[display("could not create temporary directory in {}", _0.display())]
    TempDirCreation(#[error(not(source))] PathBuf),
    #[display("temporary directory is not writable: {}", _0.display())]
    TempDirNotWritable(#[error(not(source))] PathBuf),
    /// Download failed before a complete body was received
    #[display("kit archive download failed")]
    DownloadTransport,
    #[display("kit archive download returned HTTP {_0}")]
    DownloadHttpStatus(#[error(not(source))] u16),
    /// Chunk could not be written to disk
    #[display("could not write kit archive to {}", _0.display())]
    DownloadWrite(#[error(not(source))] PathBuf),
    /// Missing or empty after download
    #[display("downloaded kit archive is invalid: {}", _0.display())]
    DownloadedArchiveInvalid(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::DownloadTransport => true,
            Self::DownloadHttpStatus(status) => *status >= 500,
            _ => false,
        }
    }
}
