//! Split `icon-families.json` into one file per icon and family style.

use super::error::{ErrorKind, Result};
use exn::ResultExt;
use fakit_storage::{Filesystem, is_plain_file_name, mkdir_all};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

pub(crate) const SVG_OBJECTS_DIR: &str = "svg-objects";
pub(crate) const METADATA_DIR: &str = "metadata";

/// One icon in `icon-families.json`. Everything except the SVGs is ignored.
#[derive(Debug, Deserialize)]
struct IconRecord {
    /// family → style → SVG
    #[serde(default)]
    svgs: BTreeMap<String, BTreeMap<String, SvgObject>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SvgObject {
    pub width: u32,
    pub height: u32,
    pub path: SvgPath,
}

/// A lone path for monotone icons, `[secondary, primary]` for duotone ones.
///
/// An empty layer is still a layer: `["", "M0"]` stays duotone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum SvgPath {
    Single(String),
    Layered([String; 2]),
}

#[derive(Serialize)]
struct IconList<'a> {
    icons: &'a [String],
}

/// Write `<staging>/svg-objects/<shorthand>/<icon>.json` for every SVG in
/// `source` and `<staging>/metadata/<shorthand>.json` listing the icons of
/// each family style. `<staging>/metadata` must already exist.
///
/// Returns the shorthands seen.
pub(crate) async fn decompose(fs: &dyn Filesystem, source: &Path, staging: &Path) -> Result<BTreeSet<String>> {
    let raw = fs.read(source).await.or_raise(|| ErrorKind::MetadataUnreadable(source.to_path_buf()))?;
    let icons: BTreeMap<String, IconRecord> = match serde_json::from_slice(&raw) {
        Ok(icons) => icons,
        Err(e) => {
            let message = e.to_string();
            return Err(e).or_raise(|| ErrorKind::MetadataParse(message));
        },
    };

    let svg_root = staging.join(SVG_OBJECTS_DIR);
    let mut by_shorthand: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, record) in &icons {
        if !is_plain_file_name(name) {
            exn::bail!(ErrorKind::MetadataParse(format!("unusable icon name {name:?}")));
        }
        for (family, styles) in &record.svgs {
            for (style, svg) in styles {
                let shorthand = fakit_family::shorthand(family, style);
                if !is_plain_file_name(&shorthand) {
                    exn::bail!(ErrorKind::MetadataParse(format!("unusable family style {family:?}/{style:?}")));
                }
                let dir = svg_root.join(&shorthand);
                if !by_shorthand.contains_key(&shorthand) {
                    mkdir_all(fs, &dir).await.or_raise(|| ErrorKind::Write(dir.clone()))?;
                }
                write_json(fs, &dir.join(format!("{name}.json")), svg).await?;
                by_shorthand.entry(shorthand).or_default().push(name.clone());
            }
        }
    }

    let metadata = staging.join(METADATA_DIR);
    for (shorthand, icons) in &by_shorthand {
        write_json(fs, &metadata.join(format!("{shorthand}.json")), &IconList { icons }).await?;
        debug!(%shorthand, icons = icons.len(), "wrote icon list");
    }
    Ok(by_shorthand.into_keys().collect())
}

pub(crate) async fn write_json<T: Serialize + ?Sized>(fs: &dyn Filesystem, path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec(value).or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    fs.write(path, &data).await.or_raise(|| ErrorKind::Write(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakit_storage::MockFilesystem;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::path::PathBuf;

    const SOURCE: &str = "/tmp/kit/metadata/icon-families.json";
    const STAGING: &str = "/tmp/kit/staging";

    fn filesystem(source: &Value) -> MockFilesystem {
        MockFilesystem::with_files([(SOURCE, source.to_string())]).with_dirs(["/tmp/kit/staging/metadata"])
    }

    async fn read_json(fs: &MockFilesystem, path: &str) -> Value {
        serde_json::from_slice(&fs.read(Path::new(path)).await.unwrap()).unwrap()
    }

    async fn run(fs: &MockFilesystem) -> Result<BTreeSet<String>> {
        decompose(fs, Path::new(SOURCE), Path::new(STAGING)).await
    }

    #[tokio::test]
    async fn test_decompose() {
        let fs = filesystem(&json!({
            "house": {
                "label": "House",
                "svgs": {
                    "classic": {
                        "solid": {"width": 576, "height": 512, "path": "M0 0", "raw": "<svg/>"},
                        "regular": {"width": 576, "height": 512, "path": "M1 1"},
                    },
                    "duotone": {"solid": {"width": 576, "height": 512, "path": ["M2", "M3"]}},
                },
            },
            "100": {"svgs": {"classic": {"solid": {"width": 512, "height": 512, "path": "M4"}}}},
        }));
        let shorthands = run(&fs).await.unwrap();
        assert_eq!(shorthands, BTreeSet::from(["duotone".to_string(), "regular".into(), "solid".into()]));

        assert_eq!(
            read_json(&fs, "/tmp/kit/staging/svg-objects/solid/house.json").await,
            json!({"width": 576, "height": 512, "path": "M0 0"})
        );
        assert_eq!(
            read_json(&fs, "/tmp/kit/staging/svg-objects/duotone/house.json").await,
            json!({"width": 576, "height": 512, "path": ["M2", "M3"]})
        );
        // All-digit names stay strings.
        assert_eq!(
            read_json(&fs, "/tmp/kit/staging/metadata/solid.json").await,
            json!({"icons": ["100", "house"]})
        );
        assert_eq!(read_json(&fs, "/tmp/kit/staging/metadata/regular.json").await, json!({"icons": ["house"]}));
    }

    #[tokio::test]
    async fn test_empty_layer_stays_duotone() {
        let fs = filesystem(&json!({
            "ghost": {"svgs": {"duotone": {"solid": {"width": 1, "height": 1, "path": ["", "M0"]}}}},
        }));
        run(&fs).await.unwrap();
        let svg = read_json(&fs, "/tmp/kit/staging/svg-objects/duotone/ghost.json").await;
        assert_eq!(svg["path"], json!(["", "M0"]));
    }

    #[tokio::test]
    async fn test_icons_without_svgs() {
        let fs = filesystem(&json!({"placeholder": {"label": "Placeholder"}}));
        assert!(run(&fs).await.unwrap().is_empty());
        assert_eq!(fs.files_under(STAGING).await, Vec::<PathBuf>::new());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let fs = MockFilesystem::default().with_dirs(["/tmp/kit/staging/metadata"]);
        let err = run(&fs).await.unwrap_err();
        assert_eq!(*err, ErrorKind::MetadataUnreadable(PathBuf::from(SOURCE)));
    }

    #[rstest]
    #[case::not_json(json!("not a map"))]
    #[case::missing_width(json!({"x": {"svgs": {"classic": {"solid": {"height": 1, "path": "M0"}}}}}))]
    #[case::three_layers(json!({"x": {"svgs": {"classic": {"solid": {"width": 1, "height": 1, "path": ["a", "b", "c"]}}}}}))]
    #[case::unsafe_name(json!({"../escape": {"svgs": {"classic": {"solid": {"width": 1, "height": 1, "path": "M0"}}}}}))]
    #[case::unsafe_style(json!({"x": {"svgs": {"classic": {"../up": {"width": 1, "height": 1, "path": "M0"}}}}}))]
    #[tokio::test]
    async fn test_parse_errors(#[case] source: Value) {
        let err = run(&filesystem(&source)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MetadataParse(_)));
    }

    #[test]
    fn test_svg_path_shapes() {
        let single: SvgPath = serde_json::from_value(json!("M0")).unwrap();
        assert_eq!(single, SvgPath::Single("M0".into()));
        let layered: SvgPath = serde_json::from_value(json!(["", "M1"])).unwrap();
        assert_eq!(layered, SvgPath::Layered([String::new(), "M1".into()]));
    }
}
