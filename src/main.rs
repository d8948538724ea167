//! CLI entry point for autoaccent.

mod cli;

use autoaccent::build_info;
use autoaccent::config::{
    initialize_default_global_config, load_config_with_diagnostics, Config, ConfigInitResult,
};
use autoaccent::matcher::closest_accent;
use autoaccent::palette::Rgb;
use autoaccent::pipeline::{log_failure, AccentPipeline};
use autoaccent::process::TokioProcessRunner;
use autoaccent::runtime::watch::spawn_gsettings_monitor;
use autoaccent::runtime::{
    spawn_runtime, LifecycleEvent, RuntimeCommand, RuntimeEvent, RuntimeSpawnConfig,
};
use autoaccent::settings::{GSettingsProvider, GSETTINGS_PROGRAM};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV_VAR: &str = "AUTOACCENT_LOG";

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_tracing(args.verbose);

    if let Some(cli::Command::Init { force }) = args.command {
        run_init(force);
        return;
    }

    let config = match load_config_with_diagnostics(args.config.as_deref()) {
        Ok(loaded) => {
            for warning in &loaded.diagnostics.warnings {
                tracing::warn!("{warning}");
            }
            loaded.config
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let code = match args.command {
        None => run_once(&config, false).await,
        Some(cli::Command::Run { dry_run }) => run_once(&config, dry_run).await,
        Some(cli::Command::Watch { no_initial_run }) => run_watch(&config, !no_initial_run).await,
        Some(cli::Command::Match { r, g, b }) => run_match(&config, Rgb::new(r, g, b)),
        Some(cli::Command::Palette) => {
            print_palette(&config);
            0
        }
        Some(cli::Command::Init { .. }) => 0,
    };
    if code != 0 {
        std::process::exit(code);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| fallback.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_pipeline(config: &Config) -> AccentPipeline {
    let runner = Arc::new(TokioProcessRunner::new(config.runtime.process_timeout));
    let settings = Arc::new(GSettingsProvider::new(runner.clone()));
    AccentPipeline::new(config, settings, runner)
}

async fn run_once(config: &Config, dry_run: bool) -> i32 {
    let pipeline = build_pipeline(config).with_dry_run(dry_run || config.runtime.dry_run);
    match pipeline.run().await {
        Ok(report) => {
            tracing::info!(
                theme = %report.theme,
                wallpaper = %report.source.path.display(),
                sample = %report.sample,
                outcome = ?report.outcome,
                "accent evaluated"
            );
            println!("{}", report.accent);
            0
        }
        Err(failure) => {
            log_failure(&failure);
            eprintln!("error: {failure}");
            1
        }
    }
}

async fn run_watch(config: &Config, run_on_start: bool) -> i32 {
    tracing::info!("{}", build_info::startup_metadata_line());
    let runner = Arc::new(TokioProcessRunner::new(config.runtime.process_timeout));
    let settings = Arc::new(GSettingsProvider::new(runner.clone()));
    let pipeline = Arc::new(AccentPipeline::new(config, settings.clone(), runner));

    let (_monitor, changes) = match spawn_gsettings_monitor(GSETTINGS_PROGRAM) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: cannot watch settings: {e}");
            return 1;
        }
    };
    let (handle, mut events) = spawn_runtime(RuntimeSpawnConfig {
        pipeline,
        settings,
        changes,
        debounce: config.runtime.debounce,
        run_on_start,
    });

    let mut shutting_down = false;
    let mut code = 0;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c(), if !shutting_down => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "failed to listen for ctrl-c");
                }
                tracing::info!("shutting down");
                shutting_down = true;
                if handle.send(RuntimeCommand::Shutdown).await.is_err() {
                    break;
                }
            }
            envelope = events.recv() => {
                let Some(envelope) = envelope else {
                    break;
                };
                match serde_json::to_string(&envelope) {
                    Ok(json) => tracing::debug!(event = %json, "runtime event"),
                    Err(e) => tracing::debug!(error = %e, "unserializable runtime event"),
                }
                match envelope.event {
                    RuntimeEvent::Lifecycle(LifecycleEvent::SettingsStreamClosed) => {
                        tracing::error!("settings monitor stopped; exiting");
                        code = 1;
                        shutting_down = true;
                        if handle.send(RuntimeCommand::Shutdown).await.is_err() {
                            break;
                        }
                    }
                    RuntimeEvent::Lifecycle(LifecycleEvent::RuntimeStopped) => break,
                    _ => {}
                }
            }
        }
    }
    code
}

fn run_match(config: &Config, sample: Rgb) -> i32 {
    match closest_accent(sample, config.palette.entries()) {
        Ok(name) => {
            println!("{name}");
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

fn print_palette(config: &Config) {
    let width = config
        .palette
        .entries()
        .iter()
        .map(|entry| entry.name.len())
        .max()
        .unwrap_or(0);
    for entry in config.palette.entries() {
        println!("{:<width$}  {}", entry.name, entry.rgb);
    }
}

fn run_init(force: bool) {
    match initialize_default_global_config(force) {
        Ok(ConfigInitResult::Created { path }) => {
            println!("wrote default config to {}", path.display());
        }
        Ok(ConfigInitResult::AlreadyInitialized { path }) => {
            println!(
                "config already exists at {} (use --force to overwrite)",
                path.display()
            );
        }
        Ok(ConfigInitResult::Overwritten { path, backup_path }) => {
            println!(
                "overwrote {} (previous config saved to {})",
                path.display(),
                backup_path.display()
            );
        }
        Err(e) => {
            eprintln!("error: failed to initialize config: {e}");
            std::process::exit(1);
        }
    }
}
