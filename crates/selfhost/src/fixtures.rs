//! Kit archives and metadata shared by tests.

use fakit_api::{KitMetadata, Release};
use serde_json::{Value, json};
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub fn zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn icon_families() -> Value {
    json!({
        "icon1": {"svgs": {"classic": {"solid": {"width": 512, "height": 512, "path": "M0 0h512v512H0z"}}}},
        "icon2": {"svgs": {"duotone": {"solid": {"width": 640, "height": 512, "path": ["M1", "M2"]}}}},
    })
}

pub fn kit_zip() -> Vec<u8> {
    let icons = icon_families().to_string();
    zip(&[
        ("css/all.css", ".fa{}"),
        ("webfonts/fa-solid-900.woff2", "wOF2"),
        ("metadata/icon-families.json", icons.as_str()),
        ("js/all.js", "//"),
    ])
}

pub fn kit_metadata() -> KitMetadata {
    KitMetadata {
        token: Some("kt-1".into()),
        license_selected: Some("pro".into()),
        release: Some(Release {
            version: Some("6.7.2".into()),
            family_styles: Some(json!([
                {"family": "classic", "style": "solid", "prefix": "fas"},
                {"family": "classic", "style": "regular", "prefix": "far"},
                {"family": "duotone", "style": "solid", "prefix": "fad"},
            ])),
        }),
    }
}
