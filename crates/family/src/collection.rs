use crate::error::{ErrorKind, Result};
use crate::style::FamilyStyle;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;

/// Family styles keyed by their short prefix id.
///
/// Prefixes are unique. Insertion order carries no meaning for lookups but is
/// kept so that exported JSON is stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyStyleCollection {
    styles: Vec<FamilyStyle>,
}
impl FamilyStyleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw list of `{family, style, prefix}` records, such as the
    /// `familyStyles` list of a kit release.
    ///
    /// All three fields must be present non-empty strings; other keys are
    /// ignored, so an exported collection can be read back in.
    ///
    /// ```
    /// use fakit_family::FamilyStyleCollection;
    ///
    /// let raw = serde_json::json!([
    ///     {"family": "classic", "style": "solid", "prefix": "fas"},
    ///     {"family": "duotone", "style": "solid", "prefix": "fad"},
    /// ]);
    /// let styles = FamilyStyleCollection::from_json(&raw).unwrap();
    /// assert_eq!(styles.get("fad").unwrap().shorthand(), "duotone");
    /// ```
    pub fn from_json(value: &Value) -> Result<Self> {
        let Some(records) = value.as_array() else {
            exn::bail!(ErrorKind::MalformedList);
        };
        let mut collection = Self::new();
        for (index, record) in records.iter().enumerate() {
            let field = |field: &'static str| -> Result<&str> {
                match record.get(field).and_then(Value::as_str) {
                    Some(s) if !s.is_empty() => Ok(s),
                    _ => exn::bail!(ErrorKind::InvalidRecord { index, field }),
                }
            };
            collection.add(FamilyStyle::new(field("family")?, field("style")?, field("prefix")?));
        }
        Ok(collection)
    }

    /// Add a family style, replacing any existing entry with the same prefix
    /// in place. Adding the same family style twice is a no-op.
    pub fn add(&mut self, style: FamilyStyle) {
        match self.styles.iter_mut().find(|fs| fs.prefix() == style.prefix()) {
            Some(existing) => *existing = style,
            None => self.styles.push(style),
        }
    }

    /// Remove the family style with `prefix`, if any.
    pub fn remove(&mut self, prefix: &str) -> Option<FamilyStyle> {
        let position = self.styles.iter().position(|fs| fs.prefix() == prefix)?;
        Some(self.styles.remove(position))
    }

    pub fn get(&self, prefix: &str) -> Option<&FamilyStyle> {
        self.styles.iter().find(|fs| fs.prefix() == prefix)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.get(prefix).is_some()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FamilyStyle> {
        self.styles.iter()
    }

    /// Keep only the family styles whose shorthand is in `shorthands`.
    pub fn retain_shorthands<S: AsRef<str>>(mut self, shorthands: impl IntoIterator<Item = S>) -> Self {
        let wanted: HashSet<String> = shorthands.into_iter().map(|s| s.as_ref().to_string()).collect();
        self.styles.retain(|fs| wanted.contains(&fs.shorthand()));
        self
    }
}
impl FromIterator<FamilyStyle> for FamilyStyleCollection {
    fn from_iter<I: IntoIterator<Item = FamilyStyle>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}
impl Extend<FamilyStyle> for FamilyStyleCollection {
    fn extend<I: IntoIterator<Item = FamilyStyle>>(&mut self, iter: I) {
        for style in iter {
            self.add(style);
        }
    }
}
impl<'a> IntoIterator for &'a FamilyStyleCollection {
    type Item = &'a FamilyStyle;
    type IntoIter = std::slice::Iter<'a, FamilyStyle>;
    fn into_iter(self) -> Self::IntoIter {
        self.styles.iter()
    }
}
impl Serialize for FamilyStyleCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.styles)
    }
}
