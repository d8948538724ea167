//! Environment variable overrides.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

use super::{Config, ConfigDiagnostics};

pub(super) const ENV_PROCESS_TIMEOUT_SECS: &str = "AUTOACCENT_PROCESS_TIMEOUT_SECS";
pub(super) const ENV_DEBOUNCE_MS: &str = "AUTOACCENT_DEBOUNCE_MS";
pub(super) const ENV_CACHE_DIR: &str = "AUTOACCENT_CACHE_DIR";

/// Apply `AUTOACCENT_*` overrides on top of file values.
pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
    diagnostics: &mut ConfigDiagnostics,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(raw) = non_empty(env_lookup, ENV_PROCESS_TIMEOUT_SECS) {
        let secs = parse_u64(ENV_PROCESS_TIMEOUT_SECS, &raw)?;
        config.runtime.process_timeout =
            Duration::from_secs(clamp_timeout_secs(secs, ENV_PROCESS_TIMEOUT_SECS, diagnostics));
    }
    if let Some(raw) = non_empty(env_lookup, ENV_DEBOUNCE_MS) {
        config.runtime.debounce = Duration::from_millis(parse_u64(ENV_DEBOUNCE_MS, &raw)?);
    }
    if let Some(raw) = non_empty(env_lookup, ENV_CACHE_DIR) {
        config.runtime.cache_dir = PathBuf::from(raw);
    }
    Ok(())
}

/// A zero timeout would fail every process; raise it to one second.
pub(super) fn clamp_timeout_secs(
    secs: u64,
    origin: &str,
    diagnostics: &mut ConfigDiagnostics,
) -> u64 {
    if secs == 0 {
        diagnostics
            .warnings
            .push(format!("{origin} = 0 is not allowed; using 1 second"));
        return 1;
    }
    secs
}

fn non_empty<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u64(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!(
            "invalid {name} value `{raw}`: expected a non-negative integer"
        ))
    })
}

/// Sort and deduplicate diagnostic strings for stable output.
pub(super) fn dedupe_diagnostics(diagnostics: &mut ConfigDiagnostics) {
    diagnostics.warnings.sort();
    diagnostics.warnings.dedup();
}
