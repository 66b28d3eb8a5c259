pub mod error;
mod file;
mod fs;
mod mkdir;
mod path;

pub use crate::file::{FileInfo, FileKind};
#[cfg(any(test, feature = "mock"))]
pub use crate::fs::MockFilesystem;
pub use crate::fs::{Filesystem, LocalFilesystem};
pub use crate::mkdir::mkdir_all;
pub use crate::path::{is_plain_file_name, validate as validate_path};
use std::sync::Arc;

pub type FsHandle = Arc<dyn Filesystem + Send + Sync>;
