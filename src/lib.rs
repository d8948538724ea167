//! Autoaccent: pick the desktop accent color that best matches the wallpaper.
//!
//! The crate resolves the wallpaper for the active light/dark theme, samples
//! its dominant color with an external tool, maps that color to the closest
//! entry of a fixed accent palette, and writes the result back to the
//! desktop settings. The watch runtime repeats this whenever a relevant
//! setting changes.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use autoaccent::config::load_config;
//! use autoaccent::pipeline::AccentPipeline;
//! use autoaccent::process::TokioProcessRunner;
//! use autoaccent::settings::GSettingsProvider;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let runner = Arc::new(TokioProcessRunner::new(config.runtime.process_timeout));
//! let settings = Arc::new(GSettingsProvider::new(runner.clone()));
//! let pipeline = AccentPipeline::new(&config, settings, runner);
//! let report = pipeline.run().await.unwrap();
//! println!("accent: {}", report.accent);
//! # }
//! ```

pub mod build_info;
pub mod config;
pub mod error;
pub mod matcher;
pub mod palette;
pub mod pipeline;
pub mod process;
pub mod runtime;
pub mod sample;
pub mod settings;
pub mod source;
#[cfg(test)]
pub mod testsupport;
