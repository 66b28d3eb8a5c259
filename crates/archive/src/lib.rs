//! The subset of zip handling a kit build needs: open an archive held in
//! memory, list its entries and pull out the ones under given prefixes.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipResult;

/// Cap on the buffer reserved up front for an entry. The size recorded in
/// the archive is only a hint.
const MAX_RESERVE: usize = 1 << 20;

/// A single extracted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name as stored in the archive
    pub name: String,
    /// Normalized relative path, safe to join onto an extraction root
    pub path: PathBuf,
    pub is_dir: bool,
    /// Decompressed contents (empty for directories)
    pub data: Vec<u8>,
}

/// Zip archive opened from bytes.
///
/// The archive is closed when dropped.
pub struct Archive {
    inner: ZipArchive<Cursor<Vec<u8>>>,
    names: Vec<String>,
}
impl Archive {
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let mut inner = ZipArchive::new(Cursor::new(bytes)).or_raise(|| ErrorKind::Unreadable)?;
        let names = (0..inner.len())
            .map(|index| inner.by_index_raw(index).map(|file| file.name().to_string()))
            .collect::<ZipResult<Vec<_>>>()
            .or_raise(|| ErrorKind::Unreadable)?;
        debug!(entries = names.len(), "opened archive");
        Ok(Self { inner, names })
    }

    /// Entry names, in the order they are stored in the archive.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Extract a single entry by name.
    ///
    /// Fails with [`InvalidEntryPath`](ErrorKind::InvalidEntryPath) before
    /// decompressing anything if the name is absolute, contains `..` or is
    /// otherwise unsafe to join onto a directory.
    pub fn extract(&mut self, name: &str) -> Result<Entry> {
        if !self.names.iter().any(|n| n == name) {
            exn::bail!(ErrorKind::EntryNotFound(name.to_string()));
        }
        let path = fakit_storage::validate_path(name).or_raise(|| ErrorKind::InvalidEntryPath(name.to_string()))?;
        let mut file = self.inner.by_name(name).or_raise(|| ErrorKind::Entry(name.to_string()))?;
        let is_dir = file.is_dir();
        let mut data = Vec::new();
        if !is_dir {
            data.reserve(usize::try_from(file.size()).unwrap_or_default().min(MAX_RESERVE));
            file.read_to_end(&mut data).or_raise(|| ErrorKind::Entry(name.to_string()))?;
        }
        Ok(Entry { name: name.to_string(), path, is_dir, data })
    }

    /// Extract every entry whose name starts with one of `prefixes`, in
    /// archive order. Stops at the first entry that fails.
    pub fn extract_matching(&mut self, prefixes: &[&str]) -> Result<Vec<Entry>> {
        let selected: Vec<String> = self
            .names
            .iter()
            .filter(|name| prefixes.iter().any(|prefix| name.starts_with(prefix)))
            .cloned()
            .collect();
        selected.iter().map(|name| self.extract(name)).collect()
    }
}
