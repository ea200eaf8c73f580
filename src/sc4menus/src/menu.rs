//! Menu identifiers and per-folder metadata.
//!
//! Every menu folder carries a `_menu.yaml` file describing the menu it
//! defines. Menu ids appear in YAML either as plain integers or as
//! `0x`-prefixed hex strings, so [`MenuId`] accepts both.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Numeric id of an in-game menu.
///
/// Used both as the button id of generated submenus and as the grouping
/// key for patch emission, so equality and ordering are defined on the
/// raw 32-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MenuId(pub u32);

impl MenuId {
    /// Raw 32-bit value.
    pub fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl From<u32> for MenuId {
    fn from(raw: u32) -> Self {
        MenuId(raw)
    }
}

impl<'de> Deserialize<'de> for MenuId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = MenuId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 32-bit menu id (integer or 0x-prefixed hex string)")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MenuId, E> {
                u32::try_from(v)
                    .map(MenuId)
                    .map_err(|_| E::custom(format!("menu id {v} does not fit in 32 bits")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MenuId, E> {
                u32::try_from(v)
                    .map(MenuId)
                    .map_err(|_| E::custom(format!("menu id {v} does not fit in 32 bits")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MenuId, E> {
                parse_numeral(v)
                    .map(MenuId)
                    .ok_or_else(|| E::custom(format!("invalid menu id `{v}`")))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Metadata parsed from a folder's `_menu.yaml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuDescriptor {
    /// The menu's numeric id.
    pub id: MenuId,

    /// Display name, also the basis for the button archive's file name.
    pub name: String,

    /// Tooltip description shown in the content browser.
    #[serde(default)]
    pub description: String,

    /// Regenerate the button even when the id belongs to a builtin menu.
    #[serde(default, rename = "override")]
    pub override_builtin: bool,
}

/// Parse a decimal or `0x`-prefixed hexadecimal `u32` literal.
pub fn parse_numeral(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

/// Derive the in-menu ordering value from a folder name.
///
/// The leading `-`/`_` sign marker is stripped first, then the first
/// `-`-separated token is parsed as a numeral: `_0x8a000001-flora` orders
/// at `0x8a000001`, `1-0x20-child` orders at `1`.
pub fn item_order(dir_name: &str) -> Option<u32> {
    let trimmed = dir_name
        .strip_prefix(['-', '_'])
        .unwrap_or(dir_name);
    let token = trimmed.split('-').next()?;
    parse_numeral(token)
}

/// Lowercase, hyphenated, filesystem-safe derivation of a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
