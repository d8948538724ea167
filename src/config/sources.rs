//! Config-file discovery.
//!
//! Precedence: explicit path > `./autoaccent.toml` > global file under the
//! config root > built-in defaults.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::{APP_DIR_NAME, CONFIG_FILE_NAME};
use super::ConfigDiagnostics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ConfigSource {
    /// Config loaded from explicit `--config` path.
    Explicit(PathBuf),
    /// Config loaded from `./autoaccent.toml`.
    Local,
    /// Config loaded from `<config root>/autoaccent/autoaccent.toml`.
    Global(PathBuf),
    /// No file found; runtime defaults were used.
    BuiltInDefaults,
}

/// Read config text from the highest-precedence available source.
pub(super) fn read_config_text_with_sources<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: &FRoot,
    diagnostics: &mut ConfigDiagnostics,
) -> Result<(String, ConfigSource), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    if let Some(p) = path_override {
        let path = PathBuf::from(p);
        let text = read_file(&path)?;
        return Ok((text, ConfigSource::Explicit(path)));
    }

    let global = config_root().map(|dir| global_config_path_in(&dir));

    if let Ok(text) = read_file(Path::new(CONFIG_FILE_NAME)) {
        if let Some(global) = &global {
            if read_file(global).is_ok() {
                diagnostics.warnings.push(format!(
                    "`./{CONFIG_FILE_NAME}` shadows global config `{}`",
                    global.display()
                ));
            }
        }
        return Ok((text, ConfigSource::Local));
    }

    if let Some(global) = global {
        if let Ok(text) = read_file(&global) {
            return Ok((text, ConfigSource::Global(global)));
        }
    }

    Ok((String::new(), ConfigSource::BuiltInDefaults))
}

/// `<root>/autoaccent/autoaccent.toml`.
pub(super) fn global_config_path_in(root: &Path) -> PathBuf {
    root.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)
}
