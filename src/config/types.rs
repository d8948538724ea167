//! Configuration data model.
//!
//! `FileConfig` mirrors the TOML layout; `Config` is the validated runtime
//! form produced by the loader.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::palette::{Palette, PaletteEntry};
use crate::process::CommandSpec;
use crate::source::{ConversionPolicy, DEFAULT_CONVERT_EXTENSIONS};

use super::defaults::{
    default_converter, default_sampler, APP_DIR_NAME, DEFAULT_DEBOUNCE_MS,
    DEFAULT_PROCESS_TIMEOUT_SECS,
};

/// Top-level runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub palette: Palette,
    pub conversion: ConversionPolicy,
    pub tools: ToolsConfig,
    pub runtime: RuntimeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: Palette::gnome(),
            conversion: ConversionPolicy::default(),
            tools: ToolsConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// External programs used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Rasterizer invoked with `{input}` and `{output}` placeholders.
    pub converter: CommandSpec,
    /// Dominant-color sampler invoked with an `{input}` placeholder.
    pub sampler: CommandSpec,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            converter: default_converter(),
            sampler: default_sampler(),
        }
    }
}

/// Resolved runtime behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub process_timeout: Duration,
    pub debounce: Duration,
    /// Directory holding rasterized copies of unsupported wallpapers.
    pub cache_dir: PathBuf,
    /// Compute the accent but never write it.
    pub dry_run: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            process_timeout: Duration::from_secs(DEFAULT_PROCESS_TIMEOUT_SECS),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            cache_dir: default_cache_dir(),
            dry_run: false,
        }
    }
}

/// `$XDG_CACHE_HOME/autoaccent`, or a temp-dir fallback.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

/// Raw `autoaccent.toml` contents.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileConfig {
    /// `[[palette]]` tables; absent means the GNOME palette.
    pub palette: Option<Vec<PaletteEntry>>,
    pub conversion: FileConversionConfig,
    pub tools: ToolsConfig,
    pub runtime: FileRuntimeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileConversionConfig {
    pub extensions: Vec<String>,
}

impl Default for FileConversionConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_CONVERT_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileRuntimeConfig {
    pub process_timeout_secs: u64,
    pub debounce_ms: u64,
    pub cache_dir: Option<String>,
    pub dry_run: bool,
}

impl Default for FileRuntimeConfig {
    fn default() -> Self {
        Self {
            process_timeout_secs: DEFAULT_PROCESS_TIMEOUT_SECS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            cache_dir: None,
            dry_run: false,
        }
    }
}

/// Non-fatal findings collected while loading config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    pub warnings: Vec<String>,
}

/// Configuration payload plus load-time diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub diagnostics: ConfigDiagnostics,
}

/// Outcome of `autoaccent init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigInitResult {
    Created { path: PathBuf },
    AlreadyInitialized { path: PathBuf },
    Overwritten { path: PathBuf, backup_path: PathBuf },
}
