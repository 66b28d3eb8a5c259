//! The kit-level facts a self-hosted kit is described by.

use super::error::{ErrorKind, Result};
use exn::ResultExt;
use fakit_api::KitMetadata;
use fakit_family::{FamilyStyle, FamilyStyleCollection};
use serde::Serialize;

/// Kit metadata with every field the pipeline needs, checked up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KitInfo {
    pub token: String,
    pub license: String,
    pub version: String,
    /// Every official family style the release knows about.
    pub family_styles: FamilyStyleCollection,
}
impl KitInfo {
    pub fn from_metadata(metadata: &KitMetadata) -> Result<Self> {
        fn required(value: Option<&str>, field: &'static str) -> Result<String> {
            match value {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => exn::bail!(ErrorKind::KitMetadataIncomplete(field)),
            }
        }

        let token = required(metadata.token.as_deref(), "token")?;
        let license = required(metadata.license_selected.as_deref(), "license")?;
        let version = required(metadata.version(), "version")?;
        let Some(raw) = metadata.family_styles() else {
            exn::bail!(ErrorKind::FamilyStylesMetadataMissing);
        };
        let family_styles = FamilyStyleCollection::from_json(raw).or_raise(|| ErrorKind::FamilyStylesMetadataMissing)?;
        Ok(Self { token, license, version, family_styles })
    }

    /// Official and kit family styles, narrowed to `shorthands`.
    pub fn included<S: AsRef<str>>(&self, shorthands: impl IntoIterator<Item = S>) -> FamilyStyleCollection {
        let mut all = self.family_styles.clone();
        all.extend([FamilyStyle::kit(), FamilyStyle::kit_duotone()]);
        all.retain_shorthands(shorthands)
    }

    /// Contents of `kit.json`.
    pub fn document<'a>(&'a self, build_id: &'a str, included: &'a FamilyStyleCollection) -> KitDocument<'a> {
        KitDocument {
            token: &self.token,
            license: &self.license,
            fontawesome_version: &self.version,
            build_id,
            included_family_styles: included,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct KitDocument<'a> {
    token: &'a str,
    license: &'a str,
    fontawesome_version: &'a str,
    build_id: &'a str,
    included_family_styles: &'a FamilyStyleCollection,
}
