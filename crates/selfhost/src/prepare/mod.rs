//! Turn a downloaded kit archive into a self-hostable directory.
//!
//! Everything is assembled under `<temp dir>/staging` and only moved into
//! the destination once complete:
//!
//! ```text
//! <destination>/
//!   css/
//!   webfonts/
//!   metadata/
//!     kit.json
//!     all-official-family-styles.json
//!     <shorthand>.json          {"icons": [...]}
//!   svg-objects/
//!     <shorthand>/<icon>.json   {width, height, path}
//! ```

pub mod error;
mod icons;
mod kit;
mod publish;

use self::error::{ErrorKind, Result};
use self::icons::{METADATA_DIR, write_json};
use self::kit::KitInfo;
use crate::fetch::ARCHIVE_FILE_NAME;
use exn::ResultExt;
use fakit_api::KitMetadata;
use fakit_archive::{Archive, Entry};
use fakit_storage::error::Result as StorageResult;
use fakit_storage::{Filesystem, mkdir_all};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Archive entries under these prefixes are extracted; the rest is ignored.
pub const ASSET_PREFIXES: [&str; 3] = ["css/", "webfonts/", "metadata/"];
/// Asset directories moved as-is into the published kit.
const ASSET_DIRS: [&str; 2] = ["css", "webfonts"];

const STAGING_DIR: &str = "staging";
const ICON_FAMILIES_FILE: &str = "icon-families.json";
const FAMILY_STYLES_FILE: &str = "all-official-family-styles.json";
const KIT_FILE: &str = "kit.json";

/// `<destination>/metadata/kit.json`. Every prepared kit has one; a
/// destination without it is not a finished kit.
pub fn kit_document_path(destination: &Path) -> PathBuf {
    destination.join(METADATA_DIR).join(KIT_FILE)
}

/// Build the self-hosted layout from `<temp_dir>/kit.zip` and publish it
/// at `destination`, replacing what was there.
///
/// On failure `temp_dir` is left as it was at the point of failure.
#[instrument(skip_all, fields(build_id = %build_id, temp_dir = %temp_dir.display(), destination = %destination.display()))]
pub async fn prepare_self_hosting(
    fs: &dyn Filesystem,
    temp_dir: &Path,
    kit: &KitMetadata,
    build_id: &str,
    destination: &Path,
) -> Result<()> {
    let readable = fs.is_dir(temp_dir).await.unwrap_or(false) && fs.is_readable(temp_dir).await.unwrap_or(false);
    if !readable {
        exn::bail!(ErrorKind::InvalidTempDir(temp_dir.to_path_buf()));
    }
    let kit = KitInfo::from_metadata(kit)?;
    mkdir_all(fs, destination)
        .await
        .or_raise(|| ErrorKind::DestinationUnavailable(destination.to_path_buf()))?;

    extract_assets(fs, temp_dir).await?;

    let staging = temp_dir.join(STAGING_DIR);
    let staging_metadata = staging.join(METADATA_DIR);
    for dir in [&staging, &staging_metadata] {
        mkdir_all(fs, dir).await.or_raise(|| ErrorKind::Write(dir.clone()))?;
    }

    let source = temp_dir.join(METADATA_DIR).join(ICON_FAMILIES_FILE);
    let shorthands = icons::decompose(fs, &source, &staging).await?;
    debug!(family_styles = shorthands.len(), "decomposed icon metadata");

    let included = kit.included(&shorthands);
    write_json(fs, &staging_metadata.join(FAMILY_STYLES_FILE), &kit.family_styles).await?;
    write_json(fs, &kit_document_path(&staging), &kit.document(build_id, &included)).await?;

    for name in ASSET_DIRS {
        let from = temp_dir.join(name);
        let to = staging.join(name);
        let present = fs
            .is_dir(&from)
            .await
            .or_raise(|| ErrorKind::DirMove { from: from.clone(), to: to.clone() })?;
        if present {
            publish::move_dir(fs, &from, &to).await?;
        } else {
            debug!(dir = name, "kit archive has no such directory, skipping");
        }
    }

    publish::publish(fs, &staging, destination).await?;
    info!(version = %kit.version, family_styles = included.len(), "prepared self-hosted kit");
    Ok(())
}

/// Extract the asset entries of `<temp_dir>/kit.zip` into `temp_dir`.
async fn extract_assets(fs: &dyn Filesystem, temp_dir: &Path) -> Result<()> {
    let path = temp_dir.join(ARCHIVE_FILE_NAME);
    let bytes = fs.read(&path).await.or_raise(|| ErrorKind::ArchiveUnreadable(path.clone()))?;
    let mut archive = Archive::open(bytes).or_raise(|| ErrorKind::ArchiveUnreadable(path.clone()))?;
    let entries = match archive.extract_matching(&ASSET_PREFIXES) {
        Ok(entries) => entries,
        Err(e) => {
            let name = e.entry_name().unwrap_or_default().to_string();
            return Err(e).or_raise(|| ErrorKind::ArchiveExtraction(name));
        },
    };
    drop(archive);

    for entry in &entries {
        write_entry(fs, &temp_dir.join(&entry.path), entry)
            .await
            .or_raise(|| ErrorKind::ArchiveExtraction(entry.name.clone()))?;
    }
    debug!(entries = entries.len(), "extracted kit assets");
    Ok(())
}

async fn write_entry(fs: &dyn Filesystem, target: &Path, entry: &Entry) -> StorageResult<()> {
    if entry.is_dir {
        return mkdir_all(fs, target).await;
    }
    if let Some(parent) = target.parent() {
        mkdir_all(fs, parent).await?;
    }
    fs.write(target, &entry.data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{icon_families, kit_metadata, kit_zip, zip};
    use async_trait::async_trait;
    use fakit_storage::error::ErrorKind as StorageErrorKind;
    use fakit_storage::{FileInfo, LocalFilesystem, MockFilesystem};
    use serde_json::{Value, json};
    use std::path::PathBuf;

    const TEMP: &str = "/tmp/fakit-0123";
    const DESTINATION: &str = "/srv/www/fontawesome-kit/kt-1/b-1";

    fn temp_with(archive: Vec<u8>) -> MockFilesystem {
        MockFilesystem::with_files([(format!("{TEMP}/kit.zip"), archive)])
    }

    async fn prepare(fs: &MockFilesystem) -> Result<()> {
        prepare_self_hosting(fs, Path::new(TEMP), &kit_metadata(), "b-1", Path::new(DESTINATION)).await
    }

    async fn read_json(fs: &MockFilesystem, path: &str) -> Value {
        serde_json::from_slice(&fs.read(&Path::new(DESTINATION).join(path)).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_prepare() {
        let fs = temp_with(kit_zip());
        prepare(&fs).await.unwrap();

        let published: Vec<PathBuf> = fs.files_under(DESTINATION).await;
        let relative: Vec<&Path> = published.iter().map(|p| p.strip_prefix(DESTINATION).unwrap()).collect();
        assert_eq!(
            relative,
            [
                Path::new("css/all.css"),
                Path::new("metadata/all-official-family-styles.json"),
                Path::new("metadata/duotone.json"),
                Path::new("metadata/kit.json"),
                Path::new("metadata/solid.json"),
                Path::new("svg-objects/duotone/icon2.json"),
                Path::new("svg-objects/solid/icon1.json"),
                Path::new("webfonts/fa-solid-900.woff2"),
            ]
        );

        assert_eq!(
            read_json(&fs, "svg-objects/solid/icon1.json").await,
            json!({"width": 512, "height": 512, "path": "M0 0h512v512H0z"})
        );
        assert_eq!(
            read_json(&fs, "svg-objects/duotone/icon2.json").await,
            json!({"width": 640, "height": 512, "path": ["M1", "M2"]})
        );
        assert_eq!(read_json(&fs, "metadata/solid.json").await, json!({"icons": ["icon1"]}));
        assert_eq!(read_json(&fs, "metadata/duotone.json").await, json!({"icons": ["icon2"]}));

        let kit = read_json(&fs, "metadata/kit.json").await;
        assert_eq!(kit["token"], "kt-1");
        assert_eq!(kit["license"], "pro");
        assert_eq!(kit["fontawesome_version"], "6.7.2");
        assert_eq!(kit["build_id"], "b-1");
        let included: Vec<&str> = kit["included_family_styles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|fs| fs["shorthand"].as_str().unwrap())
            .collect();
        assert_eq!(included, ["solid", "duotone"]);

        // The full official list, without the kit styles.
        let official = read_json(&fs, "metadata/all-official-family-styles.json").await;
        assert_eq!(official.as_array().unwrap().len(), 3);
        assert_eq!(official[1]["label"], "Regular");
    }

    #[tokio::test]
    async fn test_prepare_replaces_previous_kit() {
        let fs = temp_with(kit_zip());
        mkdir_all(&fs, Path::new(DESTINATION)).await.unwrap();
        fs.write(&Path::new(DESTINATION).join("stale.css"), b"old").await.unwrap();

        prepare(&fs).await.unwrap();
        assert!(!fs.exists(&Path::new(DESTINATION).join("stale.css")).await.unwrap());
        assert!(!fs.exists(Path::new("/srv/www/fontawesome-kit/kt-1/b-1.previous")).await.unwrap());
    }

    #[tokio::test]
    async fn test_prepare_without_optional_dirs() {
        let icons = icon_families().to_string();
        let fs = temp_with(zip(&[("metadata/icon-families.json", icons.as_str())]));
        prepare(&fs).await.unwrap();
        assert!(fs.exists(&kit_document_path(Path::new(DESTINATION))).await.unwrap());
        assert!(!fs.exists(&Path::new(DESTINATION).join("css")).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_temp_dir() {
        let fs = MockFilesystem::default();
        let err = prepare(&fs).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidTempDir(PathBuf::from(TEMP)));

        let fs = temp_with(kit_zip()).with_unreadable(TEMP);
        let err = prepare(&fs).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidTempDir(PathBuf::from(TEMP)));
    }

    #[tokio::test]
    async fn test_incomplete_metadata_checked_before_extraction() {
        let fs = temp_with(kit_zip());
        let metadata = KitMetadata { license_selected: None, ..kit_metadata() };
        let err = prepare_self_hosting(&fs, Path::new(TEMP), &metadata, "b-1", Path::new(DESTINATION))
            .await
            .unwrap_err();
        assert_eq!(*err, ErrorKind::KitMetadataIncomplete("license"));
        assert_eq!(fs.files_under(TEMP).await, [PathBuf::from(format!("{TEMP}/kit.zip"))]);
        assert!(!fs.exists(Path::new(DESTINATION)).await.unwrap());
    }

    #[tokio::test]
    async fn test_destination_unavailable() {
        let fs = temp_with(kit_zip()).with_dirs(["/srv"]).with_read_only("/srv");
        let err = prepare(&fs).await.unwrap_err();
        assert_eq!(*err, ErrorKind::DestinationUnavailable(PathBuf::from(DESTINATION)));
    }

    #[tokio::test]
    async fn test_archive_missing_or_corrupt() {
        let fs = MockFilesystem::default().with_dirs([TEMP]);
        let err = prepare(&fs).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ArchiveUnreadable(_)));

        let fs = temp_with(b"not a zip".to_vec());
        let err = prepare(&fs).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ArchiveUnreadable(_)));
    }

    #[tokio::test]
    async fn test_unsafe_entry_is_named() {
        let fs = temp_with(zip(&[("css/../../etc/passwd", "x")]));
        let err = prepare(&fs).await.unwrap_err();
        assert_eq!(*err, ErrorKind::ArchiveExtraction("css/../../etc/passwd".into()));
        assert!(!fs.exists(Path::new("/etc/passwd")).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_icon_families() {
        let fs = temp_with(zip(&[("css/all.css", ".fa{}")]));
        let err = prepare(&fs).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MetadataUnreadable(_)));
        // Nothing published, staging left for inspection.
        assert!(fs.is_dir(&Path::new(TEMP).join("staging")).await.unwrap());
        assert!(fs.files_under(DESTINATION).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_icon_families() {
        let fs = temp_with(zip(&[("metadata/icon-families.json", "[1, 2")]));
        let err = prepare(&fs).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MetadataParse(_)));
    }

    /// Fails to stat one path with an I/O error; everything else is passed
    /// through.
    struct Unstattable {
        inner: MockFilesystem,
        path: PathBuf,
    }

    #[async_trait]
    impl Filesystem for Unstattable {
        fn name(&self) -> &str {
            "unstattable"
        }
        async fn stat(&self, path: &Path) -> StorageResult<FileInfo> {
            if path == self.path {
                exn::bail!(StorageErrorKind::Io(std::io::Error::other("stale file handle")));
            }
            self.inner.stat(path).await
        }
        async fn is_readable(&self, path: &Path) -> StorageResult<bool> {
            self.inner.is_readable(path).await
        }
        async fn is_writable(&self, path: &Path) -> StorageResult<bool> {
            self.inner.is_writable(path).await
        }
        async fn create_dir(&self, path: &Path) -> StorageResult<()> {
            self.inner.create_dir(path).await
        }
        async fn read_dir(&self, path: &Path) -> StorageResult<Vec<FileInfo>> {
            self.inner.read_dir(path).await
        }
        async fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
            self.inner.read(path).await
        }
        async fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
            self.inner.write(path, data).await
        }
        async fn append(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
            self.inner.append(path, data).await
        }
        async fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
            self.inner.rename(from, to).await
        }
        async fn remove_dir_all(&self, path: &Path) -> StorageResult<()> {
            self.inner.remove_dir_all(path).await
        }
    }

    #[tokio::test]
    async fn test_unreadable_asset_dir_is_not_skipped() {
        let icons = icon_families().to_string();
        let fs = Unstattable {
            inner: temp_with(zip(&[("metadata/icon-families.json", icons.as_str())])),
            path: Path::new(TEMP).join("css"),
        };
        let err = prepare_self_hosting(&fs, Path::new(TEMP), &kit_metadata(), "b-1", Path::new(DESTINATION))
            .await
            .unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::DirMove {
                from: Path::new(TEMP).join("css"),
                to: Path::new(TEMP).join("staging/css"),
            }
        );
        assert!(!fs.inner.exists(&kit_document_path(Path::new(DESTINATION))).await.unwrap());
    }

    #[tokio::test]
    async fn test_prepare_on_local_disk() {
        let root = tempfile::tempdir().unwrap();
        let temp_dir = root.path().join("fakit-local");
        let destination = root.path().join("www/fontawesome-kit/kt-1/b-1");
        std::fs::create_dir(&temp_dir).unwrap();
        std::fs::write(temp_dir.join("kit.zip"), kit_zip()).unwrap();

        let fs = LocalFilesystem::new();
        prepare_self_hosting(&fs, &temp_dir, &kit_metadata(), "b-1", &destination).await.unwrap();
        assert_eq!(std::fs::read(destination.join("css/all.css")).unwrap(), b".fa{}");
        let solid: Value = serde_json::from_slice(&std::fs::read(destination.join("metadata/solid.json")).unwrap()).unwrap();
        assert_eq!(solid, json!({"icons": ["icon1"]}));
        assert!(!temp_dir.join("staging").exists());
    }
}
