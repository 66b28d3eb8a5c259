//! Error types for the [`prepare`](super) module.
//!
//! Any of these aborts the pipeline. Nothing written to the staging
//! directory is rolled back; the temporary directory is left as it was for
//! inspection.

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("not a readable directory: {}", _0.display())]
    InvalidTempDir(#[error(not(source))] PathBuf),
    /// Kit metadata lacks the named field
    #[display("kit metadata is missing {_0}")]
    KitMetadataIncomplete(#[error(not(source))] &'static str),
    #[display("kit metadata has no valid family styles")]
    FamilyStylesMetadataMissing,
    #[display("could not create destination directory {}", _0.display())]
    DestinationUnavailable(#[error(not(source))] PathBuf),
    #[display("could not open kit archive {}", _0.display())]
    ArchiveUnreadable(#[error(not(source))] PathBuf),
    /// Names the entry that could not be extracted
    #[display("could not extract archive entry {_0:?}")]
    ArchiveExtraction(#[error(not(source))] String),
    #[display("could not write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    #[display("could not read icon metadata {}", _0.display())]
    MetadataUnreadable(#[error(not(source))] PathBuf),
    #[display("could not parse icon metadata: {_0}")]
    MetadataParse(#[error(not(source))] String),
    #[display("could not move {} to {}", from.display(), to.display())]
    DirMove { from: PathBuf, to: PathBuf },
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
