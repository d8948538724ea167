//! Desktop settings access.
//!
//! The pipeline reads the wallpaper URIs and color scheme and writes the
//! accent name through [`SettingsProvider`]. [`GSettingsProvider`] is the GNOME
//! implementation, shelling out to `gsettings`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::AccentError;
use crate::process::{run_checked, ProcessRunner};

pub const BACKGROUND_SCHEMA: &str = "org.gnome.desktop.background";
pub const INTERFACE_SCHEMA: &str = "org.gnome.desktop.interface";
/// Command-line front end to the settings daemon.
pub const GSETTINGS_PROGRAM: &str = "gsettings";

/// Settings keys this crate reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingKey {
    /// `picture-uri`: wallpaper used in light mode.
    LightWallpaperUri,
    /// `picture-uri-dark`: wallpaper used in dark mode.
    DarkWallpaperUri,
    ColorScheme,
    AccentColor,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        Self::LightWallpaperUri,
        Self::DarkWallpaperUri,
        Self::ColorScheme,
        Self::AccentColor,
    ];

    pub fn schema(self) -> &'static str {
        match self {
            Self::LightWallpaperUri | Self::DarkWallpaperUri => BACKGROUND_SCHEMA,
            Self::ColorScheme | Self::AccentColor => INTERFACE_SCHEMA,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LightWallpaperUri => "picture-uri",
            Self::DarkWallpaperUri => "picture-uri-dark",
            Self::ColorScheme => "color-scheme",
            Self::AccentColor => "accent-color",
        }
    }

    /// Look up a key by schema and gsettings key name.
    pub fn from_schema_key(schema: &str, key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.schema() == schema && k.name() == key)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.schema(), self.name())
    }
}

/// String-valued settings store.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get(&self, key: SettingKey) -> Result<String, AccentError>;
    async fn set(&self, key: SettingKey, value: &str) -> Result<(), AccentError>;
}

/// [`SettingsProvider`] over the `gsettings` command-line tool.
pub struct GSettingsProvider {
    runner: Arc<dyn ProcessRunner>,
    program: String,
}

impl GSettingsProvider {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            program: GSETTINGS_PROGRAM.to_string(),
        }
    }
}

#[async_trait]
impl SettingsProvider for GSettingsProvider {
    async fn get(&self, key: SettingKey) -> Result<String, AccentError> {
        let args = vec!["get".to_string(), key.schema().into(), key.name().into()];
        let output = run_checked(self.runner.as_ref(), &self.program, &args)
            .await
            .map_err(|e| AccentError::Settings(format!("reading {key}: {e}")))?;
        Ok(unquote_gvariant_string(&output.stdout))
    }

    async fn set(&self, key: SettingKey, value: &str) -> Result<(), AccentError> {
        let args = vec![
            "set".to_string(),
            key.schema().into(),
            key.name().into(),
            quote_gvariant_string(value),
        ];
        run_checked(self.runner.as_ref(), &self.program, &args)
            .await
            .map_err(|e| AccentError::Settings(format!("writing {key}={value}: {e}")))?;
        Ok(())
    }
}

/// Decode the text form of a GVariant string (`'value'`) as printed by
/// `gsettings get` and `gsettings monitor`.
///
/// Unquoted input is returned trimmed.
pub fn unquote_gvariant_string(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')));
    let Some(inner) = inner else {
        return trimmed.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Encode a string as a GVariant text literal for `gsettings set`.
pub fn quote_gvariant_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
