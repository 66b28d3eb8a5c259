//! In-memory filesystem for testing.

use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::fs::Filesystem;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Node {
    Directory,
    File(Vec<u8>),
}

/// In-memory filesystem for testing.
///
/// Entries are stored in a map behind a [`RwLock`], so all trait methods can
/// operate on `&self` without external synchronisation. The root directory
/// `/` always exists. Besides plain files and directories it can simulate:
///
/// - read-only subtrees ([`with_read_only`](Self::with_read_only)),
/// - unreadable subtrees ([`with_unreadable`](Self::with_unreadable)), and
/// - separate devices, across which [`rename`](Filesystem::rename) fails with
///   [`CrossDevice`](ErrorKind::CrossDevice) ([`with_device`](Self::with_device)).
///
/// # Examples
///
/// ```ignore
/// use fakit_storage::{Filesystem, MockFilesystem};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fs = MockFilesystem::with_files([("/tmp/kit/kit.zip", b"PK...")]);
/// assert!(fs.is_dir(Path::new("/tmp/kit")).await?);
///
/// fs.write(Path::new("/tmp/kit/notes.txt"), b"data...").await?;
/// assert!(fs.exists(Path::new("/tmp/kit/notes.txt")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockFilesystem {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
    read_only: HashSet<PathBuf>,
    unreadable: HashSet<PathBuf>,
    devices: Vec<PathBuf>,
}

impl MockFilesystem {
    /// Create a mock filesystem pre-populated with files. Parent directories
    /// are created implicitly.
    ///
    /// Panics if any path is relative. If test setup is wrong, then test
    /// should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), Node::Directory);
        for (path, data) in files {
            let path = path.into();
            Self::insert_parents(&mut nodes, &path);
            nodes.insert(path, Node::File(data.into()));
        }
        Self {
            nodes: RwLock::new(nodes),
            read_only: HashSet::new(),
            unreadable: HashSet::new(),
            devices: Vec::new(),
        }
    }

    /// Add (empty) directories, including their parents.
    pub fn with_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let nodes = self.nodes.get_mut();
        for dir in dirs {
            let dir = dir.into();
            Self::insert_parents(nodes, &dir);
            nodes.insert(dir, Node::Directory);
        }
        self
    }

    /// Reject writes anywhere under `path`.
    pub fn with_read_only(mut self, path: impl Into<PathBuf>) -> Self {
        self.read_only.insert(path.into());
        self
    }

    /// Reject reads anywhere under `path`.
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    /// Treat everything under `mount` as a separate device.
    pub fn with_device(mut self, mount: impl Into<PathBuf>) -> Self {
        self.devices.push(mount.into());
        self
    }

    /// All file paths under `prefix`, sorted.
    pub async fn files_under(&self, prefix: impl AsRef<Path>) -> Vec<PathBuf> {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|(path, node)| matches!(node, Node::File(_)) && path.starts_with(prefix.as_ref()))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn insert_parents(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
        let Ok(path) = Self::absolute(path) else {
            // The panic here is DELIBERATE. MockFilesystem is intended to be
            // used in tests; panics are expected. There is no error result.
            panic!("MockFilesystem: relative path {}", path.display());
        };
        for ancestor in path.ancestors().skip(1) {
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Directory);
        }
    }

    fn absolute(path: &Path) -> Result<&Path> {
        if !path.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        }
        Ok(path)
    }

    fn under(set: &HashSet<PathBuf>, path: &Path) -> bool {
        set.iter().any(|p| path.starts_with(p))
    }

    fn device(&self, path: &Path) -> Option<&Path> {
        self.devices
            .iter()
            .filter(|mount| path.starts_with(mount))
            .max_by_key(|mount| mount.components().count())
            .map(PathBuf::as_path)
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if Self::under(&self.read_only, path) {
            exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf()));
        }
        Ok(())
    }

    fn check_readable(&self, path: &Path) -> Result<()> {
        if Self::under(&self.unreadable, path) {
            exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf()));
        }
        Ok(())
    }

    /// The parent of `path` must be an existing directory.
    fn check_parent(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> Result<()> {
        let Some(parent) = path.parent() else {
            exn::bail!(ErrorKind::AlreadyExists(path.to_path_buf()));
        };
        match nodes.get(parent) {
            Some(Node::Directory) => Ok(()),
            Some(Node::File(_)) => exn::bail!(ErrorKind::NotADirectory(parent.to_path_buf())),
            None => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
        }
    }

    fn has_children(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> bool {
        nodes.keys().any(|p| p.parent() == Some(path))
    }
}
impl Default for MockFilesystem {
    fn default() -> Self {
        let files: [(&str, &[u8]); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl Filesystem for MockFilesystem {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = Self::absolute(path)?;
        match self.nodes.read().await.get(path) {
            Some(Node::Directory) => Ok(FileInfo::directory(path)),
            Some(Node::File(data)) => Ok(FileInfo::file(path, data.len() as u64)),
            None => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
        }
    }

    async fn is_readable(&self, path: &Path) -> Result<bool> {
        Ok(self.exists(path).await? && !Self::under(&self.unreadable, path))
    }

    async fn is_writable(&self, path: &Path) -> Result<bool> {
        Ok(self.exists(path).await? && !Self::under(&self.read_only, path))
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        let path = Self::absolute(path)?;
        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(path) {
            exn::bail!(ErrorKind::AlreadyExists(path.to_path_buf()));
        }
        Self::check_parent(&nodes, path)?;
        self.check_writable(path)?;
        nodes.insert(path.to_path_buf(), Node::Directory);
        Ok(())
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<FileInfo>> {
        let path = Self::absolute(path)?;
        self.check_readable(path)?;
        let nodes = self.nodes.read().await;
        match nodes.get(path) {
            Some(Node::Directory) => {},
            Some(Node::File(_)) => exn::bail!(ErrorKind::NotADirectory(path.to_path_buf())),
            None => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
        }
        Ok(nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, node)| match node {
                Node::Directory => FileInfo::directory(p),
                Node::File(data) => FileInfo::file(p, data.len() as u64),
            })
            .collect())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = Self::absolute(path)?;
        self.check_readable(path)?;
        match self.nodes.read().await.get(path) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Directory) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            None => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
        }
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = Self::absolute(path)?;
        let mut nodes = self.nodes.write().await;
        Self::check_parent(&nodes, path)?;
        self.check_writable(path)?;
        if let Some(Node::Directory) = nodes.get(path) {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        }
        nodes.insert(path.to_path_buf(), Node::File(data.to_vec()));
        Ok(())
    }

    async fn append(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = Self::absolute(path)?;
        let mut nodes = self.nodes.write().await;
        Self::check_parent(&nodes, path)?;
        self.check_writable(path)?;
        match nodes.entry(path.to_path_buf()).or_insert_with(|| Node::File(Vec::new())) {
            Node::File(existing) => existing.extend_from_slice(data),
            Node::Directory => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
        }
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = Self::absolute(from)?;
        let to = Self::absolute(to)?;
        if to.starts_with(from) && to != from {
            exn::bail!(ErrorKind::InvalidPath(to.to_path_buf()));
        }
        let mut nodes = self.nodes.write().await;
        let Some(source) = nodes.get(from).cloned() else {
            exn::bail!(ErrorKind::NotFound(from.to_path_buf()));
        };
        if self.device(from) != self.device(to) {
            exn::bail!(ErrorKind::CrossDevice(to.to_path_buf()));
        }
        Self::check_parent(&nodes, to)?;
        self.check_writable(from)?;
        self.check_writable(to)?;
        match (&source, nodes.get(to)) {
            (_, None) => {},
            (Node::Directory, Some(Node::Directory)) if !Self::has_children(&nodes, to) => {},
            (Node::Directory, Some(Node::Directory)) => exn::bail!(ErrorKind::DirectoryNotEmpty(to.to_path_buf())),
            (Node::Directory, Some(Node::File(_))) => exn::bail!(ErrorKind::NotADirectory(to.to_path_buf())),
            (Node::File(_), Some(Node::Directory)) => exn::bail!(ErrorKind::InvalidPath(to.to_path_buf())),
            (Node::File(_), Some(Node::File(_))) => {},
        }
        let moved: Vec<PathBuf> = nodes.keys().filter(|p| p.starts_with(from)).cloned().collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                // Infallible: every moved path starts with `from`.
                let relative = old.strip_prefix(from).unwrap_or(Path::new(""));
                let new = match relative.as_os_str().is_empty() {
                    true => to.to_path_buf(),
                    false => to.join(relative),
                };
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let path = Self::absolute(path)?;
        self.check_writable(path)?;
        let mut nodes = self.nodes.write().await;
        match nodes.get(path) {
            Some(Node::Directory) => {},
            Some(Node::File(_)) => exn::bail!(ErrorKind::NotADirectory(path.to_path_buf())),
            None => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
        }
        nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}
