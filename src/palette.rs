//! Named reference colors that wallpaper samples are matched against.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;

/// An sRGB triple with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// One named accent color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub name: String,
    pub rgb: Rgb,
}

impl PaletteEntry {
    pub fn new(name: impl Into<String>, rgb: Rgb) -> Self {
        Self {
            name: name.into(),
            rgb,
        }
    }
}

/// Ordered, immutable collection of accent colors.
///
/// Order is significant: the matcher resolves equal distances in favor of the
/// earlier entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Wrap entries as-is. Use [`Palette::from_entries`] for validated input.
    pub fn new(entries: Vec<PaletteEntry>) -> Self {
        Self { entries }
    }

    /// Build a palette from configured entries, rejecting blank or repeated
    /// names and empty input.
    pub fn from_entries(entries: Vec<PaletteEntry>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::Invalid(
                "palette must contain at least one entry".into(),
            ));
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "palette entry {} has an empty name",
                    entry.rgb
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!(
                    "palette entry `{name}` is listed more than once"
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The nine GNOME accent colors.
    pub fn gnome() -> Self {
        Self::new(default_entries())
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::gnome()
    }
}

/// Entries backing [`Palette::gnome`], in tie-break order.
pub fn default_entries() -> Vec<PaletteEntry> {
    [
        ("blue", Rgb::new(53, 131, 227)),
        ("teal", Rgb::new(33, 144, 164)),
        ("green", Rgb::new(58, 148, 74)),
        ("yellow", Rgb::new(200, 136, 0)),
        ("orange", Rgb::new(237, 91, 0)),
        ("red", Rgb::new(230, 45, 66)),
        ("pink", Rgb::new(213, 97, 153)),
        ("purple", Rgb::new(145, 65, 172)),
        ("slate", Rgb::new(111, 131, 150)),
    ]
    .into_iter()
    .map(|(name, rgb)| PaletteEntry::new(name, rgb))
    .collect()
}
