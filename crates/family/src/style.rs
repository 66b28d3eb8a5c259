use crate::naming::{self, KIT, KIT_DUOTONE};
use serde::{Serialize, Serializer};

/// A single (family, style) pair, as listed in kit release metadata.
///
/// Immutable once constructed. The [`shorthand`](Self::shorthand),
/// [`label`](Self::label) and [`asset_file_stem`](Self::asset_file_stem) are
/// derived on demand from the naming rules in [`crate::naming`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FamilyStyle {
    family: String,
    style: String,
    prefix: String,
}
impl FamilyStyle {
    pub fn new(family: impl Into<String>, style: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
            prefix: prefix.into(),
        }
    }

    /// Family style of icons uploaded to a kit (`fak`).
    pub fn kit() -> Self {
        Self::new(KIT, "custom", "fak")
    }

    /// Family style of two-tone icons uploaded to a kit (`fakd`).
    pub fn kit_duotone() -> Self {
        Self::new(KIT_DUOTONE, "custom", "fakd")
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    /// Short prefix id, e.g. `fas` or `fak`. Unique within a collection.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn shorthand(&self) -> String {
        naming::shorthand(&self.family, &self.style)
    }

    pub fn label(&self) -> String {
        naming::label(&self.family, &self.style)
    }

    pub fn asset_file_stem(&self) -> String {
        naming::asset_file_stem(&self.family, &self.style)
    }
}

/// Exported alongside the derived names so consumers of the JSON don't have
/// to re-implement the naming rules.
#[derive(Serialize)]
struct Export<'a> {
    family: &'a str,
    style: &'a str,
    prefix: &'a str,
    shorthand: String,
    label: String,
}
impl Serialize for FamilyStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Export {
            family: &self.family,
            style: &self.style,
            prefix: &self.prefix,
            shorthand: self.shorthand(),
            label: self.label(),
        }
        .serialize(serializer)
    }
}
