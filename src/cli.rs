//! CLI argument parsing via clap.

use autoaccent::build_info;
use clap::{Parser, Subcommand};

/// Match the desktop accent color to the current wallpaper.
#[derive(Debug, Parser)]
#[command(name = "autoaccent", version, long_version = build_info::LONG_VERSION)]
pub struct Args {
    /// Path to config file (default: ./autoaccent.toml or ~/.config/autoaccent/autoaccent.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Log at debug level unless AUTOACCENT_LOG says otherwise.
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate the wallpaper once and apply the accent (default).
    Run {
        /// Print the accent without writing it.
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Re-evaluate whenever the wallpaper or color scheme changes.
    Watch {
        /// Skip the evaluation normally done at startup.
        #[arg(long = "no-initial-run")]
        no_initial_run: bool,
    },
    /// Print the palette entry closest to an RGB color.
    Match {
        r: u8,
        g: u8,
        b: u8,
    },
    /// List the configured accent palette.
    Palette,
    /// Write the default config to ~/.config/autoaccent/autoaccent.toml.
    Init {
        /// Overwrite an existing config (a timestamped backup is kept).
        #[arg(long = "force")]
        force: bool,
    },
}
