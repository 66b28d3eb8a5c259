//! Naming rules for family styles.
//!
//! These strings end up in file names, CSS class names and URLs of
//! self-hosted kits, so they must stay byte-for-byte stable. Every function
//! is total: families without a special rule fall through to the generic
//! `family-style` pattern.

/// The family used by the classic (original) Font Awesome icon set.
pub const CLASSIC: &str = "classic";
/// The family used by the original two-tone icon set.
pub const DUOTONE: &str = "duotone";
/// Family of icons uploaded to a kit by its owner.
pub const KIT: &str = "kit";
/// Family of two-tone icons uploaded to a kit by its owner.
pub const KIT_DUOTONE: &str = "kit-duotone";

/// Canonical short identifier for a family style.
///
/// ```
/// use fakit_family::shorthand;
///
/// assert_eq!(shorthand("classic", "regular"), "regular");
/// assert_eq!(shorthand("duotone", "solid"), "duotone");
/// assert_eq!(shorthand("sharp-duotone", "light"), "sharp-duotone-light");
/// ```
pub fn shorthand(family: &str, style: &str) -> String {
    match (family, style) {
        (CLASSIC, _) => style.to_string(),
        (DUOTONE, "solid") => DUOTONE.to_string(),
        _ => format!("{family}-{style}"),
    }
}

/// Stem used for asset files (CSS, webfonts) of a family style.
///
/// Identical to [`shorthand`] except for the kit families, whose assets are
/// published under the `custom-icons` name.
pub fn asset_file_stem(family: &str, style: &str) -> String {
    match family {
        KIT => "custom-icons".to_string(),
        KIT_DUOTONE => "custom-icons-duotone".to_string(),
        _ => shorthand(family, style),
    }
}

/// Human readable label for a family style.
///
/// ```
/// use fakit_family::label;
///
/// assert_eq!(label("classic", "solid"), "Solid");
/// assert_eq!(label("sharp-duotone", "thin"), "Sharp Duotone Thin");
/// ```
pub fn label(family: &str, style: &str) -> String {
    if family == CLASSIC || style == "brands" {
        return capitalize(style);
    }
    let family = family.split('-').map(capitalize).collect::<Vec<_>>().join(" ");
    format!("{family} {}", capitalize(style))
}

/// Upper-cases the first character only.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
