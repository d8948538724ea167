//! Error types for configuration, subprocesses, and accent evaluation.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ProcessError
// ---------------------------------------------------------------------------

/// Failure of one external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The program could not be started (missing binary, permissions).
    Spawn { program: String, message: String },
    /// The process did not finish within the configured limit.
    TimedOut { program: String, limit: Duration },
    /// The process exited unsuccessfully.
    Failed {
        program: String,
        exit_code: i32,
        stderr: String,
    },
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { program, message } => write!(f, "{program}: {message}"),
            Self::TimedOut { program, limit } => write!(
                f,
                "{program} timed out after {}",
                crate::process::format_duration(*limit)
            ),
            Self::Failed {
                program,
                exit_code,
                stderr,
            } => {
                if stderr.trim().is_empty() {
                    write!(f, "{program} exited with {exit_code}")
                } else {
                    write!(f, "{program} exited with {exit_code}: {}", stderr.trim())
                }
            }
        }
    }
}

impl std::error::Error for ProcessError {}

// ---------------------------------------------------------------------------
// AccentError
// ---------------------------------------------------------------------------

/// Errors that abort a single accent evaluation.
///
/// Apart from [`AccentError::Configuration`], every variant is recoverable:
/// the run is abandoned and the current accent setting is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccentError {
    /// The palette is empty; nothing can be matched.
    Configuration(String),
    /// The wallpaper path is empty or has no extension.
    InvalidPath(String),
    /// The settings provider returned no usable wallpaper URI.
    SourceUnavailable(String),
    /// The raster converter failed.
    Conversion(ProcessError),
    /// The dominant-color sampler could not be run.
    Sampling(ProcessError),
    /// Sampler output is neither an `(R, G, B)` triple nor a color histogram.
    SampleParse(String),
    /// Reading or writing a setting failed.
    Settings(String),
}

impl fmt::Display for AccentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration: {msg}"),
            Self::InvalidPath(msg) => write!(f, "invalid path: {msg}"),
            Self::SourceUnavailable(msg) => write!(f, "source unavailable: {msg}"),
            Self::Conversion(e) => write!(f, "conversion failed: {e}"),
            Self::Sampling(e) => write!(f, "sampler failed: {e}"),
            Self::SampleParse(msg) => write!(f, "unparsable sample: {msg}"),
            Self::Settings(msg) => write!(f, "settings: {msg}"),
        }
    }
}

impl std::error::Error for AccentError {}
