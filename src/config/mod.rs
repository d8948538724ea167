//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`AUTOACCENT_PROCESS_TIMEOUT_SECS`,
//!    `AUTOACCENT_DEBOUNCE_MS`, `AUTOACCENT_CACHE_DIR`)
//! 2. TOML file specified via `--config`
//! 3. `./autoaccent.toml` in the current directory
//! 4. `$XDG_CONFIG_HOME/autoaccent/autoaccent.toml` (or
//!    `~/.config/autoaccent/autoaccent.toml`)
//! 5. Built-in defaults

mod defaults;
mod env;
mod init;
mod loader;
mod sources;
mod types;

pub use init::{config_root_dir, default_global_config_path, initialize_default_global_config};
pub use loader::{load_config, load_config_with_diagnostics};
pub use types::{
    default_cache_dir, Config, ConfigDiagnostics, ConfigInitResult, LoadedConfig, RuntimeConfig,
    ToolsConfig,
};
