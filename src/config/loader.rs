//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::palette::Palette;
use crate::source::ConversionPolicy;

use super::env::{apply_runtime_env_overrides, clamp_timeout_secs, dedupe_diagnostics};
use super::init::config_root_dir;
use super::sources::read_config_text_with_sources;
use super::types::{default_cache_dir, FileConfig};
use super::{Config, ConfigDiagnostics, LoadedConfig, RuntimeConfig};

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from `--config`).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    Ok(load_config_with_diagnostics(path_override)?.config)
}

/// Load configuration and return non-fatal diagnostics.
pub fn load_config_with_diagnostics(
    path_override: Option<&str>,
) -> Result<LoadedConfig, ConfigError> {
    load_config_with_diagnostics_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(super) fn load_config_with_diagnostics_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let mut diagnostics = ConfigDiagnostics::default();
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root, &mut diagnostics)?;
    tracing::debug!(?source, "reading configuration");
    let parsed: FileConfig = toml::from_str(&config_text)?;
    let mut config = resolve_config_from_file_config(parsed, &env_lookup, &mut diagnostics)?;
    apply_runtime_env_overrides(&mut config, &env_lookup, &mut diagnostics)?;
    dedupe_diagnostics(&mut diagnostics);

    Ok(LoadedConfig {
        config,
        diagnostics,
    })
}

fn resolve_config_from_file_config<FEnv>(
    parsed: FileConfig,
    env_lookup: &FEnv,
    diagnostics: &mut ConfigDiagnostics,
) -> Result<Config, ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    let palette = match parsed.palette {
        Some(entries) => Palette::from_entries(entries)?,
        None => Palette::gnome(),
    };

    for ext in &parsed.conversion.extensions {
        if ext.starts_with('.') {
            diagnostics.warnings.push(format!(
                "conversion extension `{ext}` should be written without the leading dot"
            ));
        }
    }
    let conversion = ConversionPolicy::new(parsed.conversion.extensions);

    for (label, spec) in [
        ("converter", &parsed.tools.converter),
        ("sampler", &parsed.tools.sampler),
    ] {
        if spec.program.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "tools.{label}.program must not be empty"
            )));
        }
        if !spec.args.iter().any(|arg| arg.contains("{input}")) {
            return Err(ConfigError::Invalid(format!(
                "tools.{label}.args must reference `{{input}}`"
            )));
        }
    }
    if !parsed
        .tools
        .converter
        .args
        .iter()
        .any(|arg| arg.contains("{output}"))
    {
        return Err(ConfigError::Invalid(
            "tools.converter.args must reference `{output}`".into(),
        ));
    }

    let runtime = RuntimeConfig {
        process_timeout: Duration::from_secs(clamp_timeout_secs(
            parsed.runtime.process_timeout_secs,
            "runtime.process_timeout_secs",
            diagnostics,
        )),
        debounce: Duration::from_millis(parsed.runtime.debounce_ms),
        cache_dir: parsed
            .runtime
            .cache_dir
            .as_deref()
            .map(|dir| expand_tilde(dir, env_lookup))
            .unwrap_or_else(default_cache_dir),
        dry_run: parsed.runtime.dry_run,
    };

    Ok(Config {
        palette,
        conversion,
        tools: parsed.tools,
        runtime,
    })
}

/// Expand a leading `~/` using `$HOME`.
fn expand_tilde<FEnv>(path: &str, env_lookup: &FEnv) -> PathBuf
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = env_lookup("HOME").or_else(|| {
            dirs::home_dir().map(|home| home.to_string_lossy().into_owned())
        }) {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
