//! Compile-time build metadata for `--version` output.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("AUTOACCENT_BUILD_GIT_HASH");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: &str = env!("AUTOACCENT_BUILD_TIMESTAMP");

/// Multi-line block printed by `autoaccent --version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("AUTOACCENT_BUILD_GIT_HASH"),
    "\nbuilt: ",
    env!("AUTOACCENT_BUILD_TIMESTAMP")
);

/// One-line summary logged when the watch runtime starts.
pub fn startup_metadata_line() -> String {
    format!("autoaccent v{VERSION} ({GIT_COMMIT}, built {BUILD_TIMESTAMP})")
}
