//! Wallpaper source selection from theme mode and the two wallpaper URIs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::AccentError;

/// `color-scheme` value that selects the dark wallpaper.
pub const PREFER_DARK: &str = "prefer-dark";

const FILE_URI_PREFIX: &str = "file://";
const LOCALHOST_AUTHORITY: &str = "localhost";

/// Light/dark theme state as reported by the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    /// Interpret a `color-scheme` setting value.
    ///
    /// Only `prefer-dark` means dark; `default` and `prefer-light` are light.
    pub fn from_color_scheme(value: &str) -> Self {
        if value.trim() == PREFER_DARK {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

/// The wallpaper file that is active for the current theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperSource {
    pub path: PathBuf,
    /// Text after the last `.` of the file name, as written.
    pub extension: String,
}

/// Pick the wallpaper for `theme` and turn its URI into a local path.
pub fn resolve_active_wallpaper(
    theme: ThemeMode,
    light_uri: &str,
    dark_uri: &str,
) -> Result<WallpaperSource, AccentError> {
    let uri = match theme {
        ThemeMode::Dark => dark_uri,
        ThemeMode::Light => light_uri,
    };
    let path = uri_to_path(uri)?;
    let extension = file_extension(&path)?;
    Ok(WallpaperSource {
        path: PathBuf::from(path),
        extension,
    })
}

/// Strip a leading `file://` (with an empty or `localhost` authority) and
/// decode percent escapes. The result must be an absolute path.
pub fn uri_to_path(uri: &str) -> Result<String, AccentError> {
    let trimmed = uri.trim();
    let raw = match trimmed.strip_prefix(FILE_URI_PREFIX) {
        Some(rest) => rest.strip_prefix(LOCALHOST_AUTHORITY).unwrap_or(rest),
        None => trimmed,
    };
    if raw.contains("://") {
        return Err(AccentError::InvalidPath(format!(
            "`{uri}` is not a local file URI"
        )));
    }
    let decoded = urlencoding::decode(raw)
        .map_err(|e| AccentError::InvalidPath(format!("`{uri}`: {e}")))?;
    if decoded.is_empty() {
        return Err(AccentError::InvalidPath(format!(
            "`{uri}` does not name a file"
        )));
    }
    if !decoded.starts_with('/') {
        return Err(AccentError::InvalidPath(format!(
            "`{uri}` is not an absolute local path"
        )));
    }
    Ok(decoded.into_owned())
}

fn file_extension(path: &str) -> Result<String, AccentError> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Ok(ext.to_string()),
        _ => Err(AccentError::InvalidPath(format!(
            "`{path}` has no file extension"
        ))),
    }
}

/// Extensions the sampler cannot read directly by default.
pub const DEFAULT_CONVERT_EXTENSIONS: &[&str] = &["svg", "jxl"];

/// True when the default sampler needs a raster copy of this format first.
pub fn requires_conversion(extension: &str) -> bool {
    DEFAULT_CONVERT_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Configured set of formats that go through the raster converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPolicy {
    extensions: Vec<String>,
}

impl ConversionPolicy {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn requires_conversion(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Default for ConversionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERT_EXTENSIONS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIGHT: &str = "file:///usr/share/backgrounds/gnome/blobs-l.svg";
    const DARK: &str = "file:///usr/share/backgrounds/gnome/blobs-d.jxl";

    #[test]
    fn dark_theme_uses_dark_uri() {
        let source = resolve_active_wallpaper(ThemeMode::Dark, LIGHT, DARK).unwrap();
        assert_eq!(
            source,
            WallpaperSource {
                path: PathBuf::from("/usr/share/backgrounds/gnome/blobs-d.jxl"),
                extension: "jxl".into(),
            }
        );
    }

    #[test]
    fn light_theme_uses_light_uri() {
        let source = resolve_active_wallpaper(ThemeMode::Light, LIGHT, DARK).unwrap();
        assert_eq!(
            source.path,
            PathBuf::from("/usr/share/backgrounds/gnome/blobs-l.svg")
        );
        assert_eq!(source.extension, "svg");
    }

    #[test]
    fn color_scheme_parsing() {
        assert_eq!(ThemeMode::from_color_scheme("prefer-dark"), ThemeMode::Dark);
        assert_eq!(ThemeMode::from_color_scheme("default"), ThemeMode::Light);
        assert_eq!(ThemeMode::from_color_scheme("prefer-light"), ThemeMode::Light);
        assert_eq!(ThemeMode::from_color_scheme(""), ThemeMode::Light);
    }

    #[test]
    fn plain_paths_and_percent_escapes_are_accepted() {
        let source =
            resolve_active_wallpaper(ThemeMode::Light, "file:///home/u/My%20Walls/sea.png", "")
                .unwrap();
        assert_eq!(source.path, PathBuf::from("/home/u/My Walls/sea.png"));

        let bare = resolve_active_wallpaper(ThemeMode::Light, "/tmp/w.jpeg", "").unwrap();
        assert_eq!(bare.extension, "jpeg");
    }

    #[test]
    fn extension_comes_from_file_name_only() {
        let err =
            resolve_active_wallpaper(ThemeMode::Light, "file:///home/u/v1.2/wallpaper", "")
                .unwrap_err();
        assert!(matches!(err, AccentError::InvalidPath(_)), "got: {err:?}");

        let trailing_dot =
            resolve_active_wallpaper(ThemeMode::Light, "file:///tmp/wall.", "").unwrap_err();
        assert!(matches!(trailing_dot, AccentError::InvalidPath(_)));
    }

    #[test]
    fn empty_path_is_invalid() {
        for uri in ["", "file://", "   "] {
            let err = resolve_active_wallpaper(ThemeMode::Dark, LIGHT, uri).unwrap_err();
            assert!(matches!(err, AccentError::InvalidPath(_)), "{uri:?}: {err:?}");
        }
    }

    #[test]
    fn localhost_authority_is_stripped() {
        assert_eq!(
            uri_to_path("file://localhost/home/u/a.png").unwrap(),
            "/home/u/a.png"
        );
        let source =
            resolve_active_wallpaper(ThemeMode::Dark, LIGHT, "file://localhost/w/night%20sky.jxl")
                .unwrap();
        assert_eq!(source.path, PathBuf::from("/w/night sky.jxl"));
    }

    #[test]
    fn relative_and_foreign_host_paths_are_rejected() {
        for uri in ["file://otherhost/home/u/a.png", "walls/a.png", "file://localhost"] {
            let err = uri_to_path(uri).unwrap_err();
            assert!(matches!(err, AccentError::InvalidPath(_)), "{uri:?}: {err:?}");
        }
    }

    #[test]
    fn remote_uris_are_rejected() {
        let err =
            resolve_active_wallpaper(ThemeMode::Light, "https://example.com/a.png", "").unwrap_err();
        assert!(err.to_string().contains("not a local file"), "got: {err}");
    }

    #[test]
    fn default_conversion_set() {
        assert!(requires_conversion("svg"));
        assert!(requires_conversion("jxl"));
        assert!(requires_conversion("SVG"));
        assert!(!requires_conversion("jpg"));
        assert!(!requires_conversion("png"));
    }

    #[test]
    fn configured_policy_normalizes_entries() {
        let policy = ConversionPolicy::new([".AVIF", "heic"]);
        assert_eq!(policy.extensions(), ["avif", "heic"]);
        assert!(policy.requires_conversion("avif"));
        assert!(policy.requires_conversion("HEIC"));
        assert!(!policy.requires_conversion("svg"));
        assert!(ConversionPolicy::default().requires_conversion("jxl"));
    }
}
