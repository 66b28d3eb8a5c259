//! Family style registry.
//!
//! Font Awesome icons are organised along two axes, a *family* (`classic`,
//! `sharp`, `duotone`, ...) and a *style* (`solid`, `light`, ...). This crate
//! holds the naming rules that turn a (family, style) pair into the
//! shorthand, label and asset file stem used by self-hosted kits, plus a
//! [`FamilyStyleCollection`] keyed by short prefix id (`fas`, `fak`, ...).

mod collection;
pub mod error;
pub mod naming;
mod style;

pub use crate::collection::FamilyStyleCollection;
pub use crate::naming::{asset_file_stem, label, shorthand};
pub use crate::style::FamilyStyle;
