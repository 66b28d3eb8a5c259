use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Not a zip archive, or its central directory is corrupt
    #[display("archive is unreadable")]
    Unreadable,
    #[display("archive has no entry named {_0:?}")]
    EntryNotFound(#[error(not(source))] String),
    /// Entry name would escape the extraction root
    #[display("archive entry has an unsafe name: {_0:?}")]
    InvalidEntryPath(#[error(not(source))] String),
    /// Entry exists but could not be decompressed
    #[display("could not extract archive entry {_0:?}")]
    Entry(#[error(not(source))] String),
}

impl ErrorKind {
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::Unreadable => None,
            Self::EntryNotFound(name) | Self::InvalidEntryPath(name) | Self::Entry(name) => Some(name),
        }
    }

    pub fn is_retryable(&self) -> bool {
        false
    }
}
