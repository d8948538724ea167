//! Wallpaper-to-accent evaluation.
//!
//! One run walks `ResolvingSource → (Converting) → Sampling → Matching →
//! Applying` and then returns to `Idle`. Any error moves the run to `Failed`
//! and then `Idle`; the accent setting is only written at the very end, so a
//! failed run never changes it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ToolsConfig};
use crate::error::{AccentError, ProcessError};
use crate::matcher::closest_accent;
use crate::palette::{Palette, Rgb};
use crate::process::{run_checked, ProcessRunner};
use crate::sample::parse_sample_output;
use crate::settings::{SettingKey, SettingsProvider};
use crate::source::{resolve_active_wallpaper, ConversionPolicy, ThemeMode, WallpaperSource};

/// File name of the rasterized wallpaper inside the cache directory.
pub const CONVERTED_FILE_NAME: &str = "converted_bg.jpg";

/// Position of a run in the evaluation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Idle,
    ResolvingSource,
    Converting,
    Sampling,
    Matching,
    Applying,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ResolvingSource => "resolving-source",
            Self::Converting => "converting",
            Self::Sampling => "sampling",
            Self::Matching => "matching",
            Self::Applying => "applying",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What happened to the accent setting at the end of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyOutcome {
    Written,
    /// The setting already held this accent.
    Unchanged,
    DryRun,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub theme: ThemeMode,
    pub source: WallpaperSource,
    /// File handed to the sampler: the wallpaper itself or its cached raster.
    pub raster_path: PathBuf,
    pub sample: Rgb,
    pub accent: String,
    pub outcome: ApplyOutcome,
}

impl RunReport {
    pub fn converted(&self) -> bool {
        self.raster_path != self.source.path
    }
}

/// A run that stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// Stage that was active when the error occurred.
    pub stage: Stage,
    pub error: AccentError,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage: {}", self.stage, self.error)
    }
}

impl std::error::Error for RunFailure {}

struct StageTracker<'a> {
    current: Stage,
    observe: &'a mut (dyn FnMut(Stage) + Send),
}

impl StageTracker<'_> {
    fn enter(&mut self, next: Stage) {
        tracing::debug!(from = %self.current, to = %next, "stage transition");
        self.current = next;
        (self.observe)(next);
    }

    fn fail(&self, error: AccentError) -> RunFailure {
        RunFailure {
            stage: self.current,
            error,
        }
    }
}

/// Resolves, samples, matches, and applies the accent for the current
/// wallpaper.
pub struct AccentPipeline {
    settings: Arc<dyn SettingsProvider>,
    runner: Arc<dyn ProcessRunner>,
    palette: Palette,
    conversion: ConversionPolicy,
    tools: ToolsConfig,
    cache_dir: PathBuf,
    dry_run: bool,
}

impl AccentPipeline {
    pub fn new(
        config: &Config,
        settings: Arc<dyn SettingsProvider>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            settings,
            runner,
            palette: config.palette.clone(),
            conversion: config.conversion.clone(),
            tools: config.tools.clone(),
            cache_dir: config.runtime.cache_dir.clone(),
            dry_run: config.runtime.dry_run,
        }
    }

    /// Compute the accent without writing it.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Deterministic location of the rasterized wallpaper.
    pub fn converted_path(&self) -> PathBuf {
        self.cache_dir.join(CONVERTED_FILE_NAME)
    }

    pub async fn run(&self) -> Result<RunReport, RunFailure> {
        self.run_observed(|_| {}).await
    }

    /// Run once, reporting every stage entered to `observe`.
    ///
    /// The last stage reported is always [`Stage::Idle`], preceded by
    /// [`Stage::Failed`] when the run fails.
    pub async fn run_observed<F>(&self, mut observe: F) -> Result<RunReport, RunFailure>
    where
        F: FnMut(Stage) + Send,
    {
        let mut tracker = StageTracker {
            current: Stage::Idle,
            observe: &mut observe,
        };
        let result = self.evaluate(&mut tracker).await;
        if result.is_err() {
            tracker.enter(Stage::Failed);
        }
        tracker.enter(Stage::Idle);
        result
    }

    /// Run once and log the outcome instead of returning the error.
    pub async fn run_logged(&self) -> Option<RunReport> {
        match self.run().await {
            Ok(report) => {
                log_report(&report);
                Some(report)
            }
            Err(failure) => {
                log_failure(&failure);
                None
            }
        }
    }

    async fn evaluate(&self, tracker: &mut StageTracker<'_>) -> Result<RunReport, RunFailure> {
        tracker.enter(Stage::ResolvingSource);
        let (theme, source) = self.resolve_source().await.map_err(|e| tracker.fail(e))?;
        tracing::info!(
            %theme,
            path = %source.path.display(),
            extension = %source.extension,
            "resolved wallpaper"
        );

        let raster_path = if self.conversion.requires_conversion(&source.extension) {
            tracker.enter(Stage::Converting);
            self.convert(&source.path)
                .await
                .map_err(|e| tracker.fail(e))?
        } else {
            source.path.clone()
        };

        tracker.enter(Stage::Sampling);
        let sample = self
            .sample(&raster_path)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.enter(Stage::Matching);
        let accent = closest_accent(sample, self.palette.entries())
            .map_err(|e| tracker.fail(e))?
            .to_string();

        tracker.enter(Stage::Applying);
        let outcome = self.apply(&accent).await.map_err(|e| tracker.fail(e))?;

        Ok(RunReport {
            theme,
            source,
            raster_path,
            sample,
            accent,
            outcome,
        })
    }

    async fn resolve_source(&self) -> Result<(ThemeMode, WallpaperSource), AccentError> {
        let scheme = self.settings.get(SettingKey::ColorScheme).await?;
        let theme = ThemeMode::from_color_scheme(&scheme);
        let light_uri = self.settings.get(SettingKey::LightWallpaperUri).await?;
        let dark_uri = self.settings.get(SettingKey::DarkWallpaperUri).await?;

        let (active_key, active_uri) = match theme {
            ThemeMode::Dark => (SettingKey::DarkWallpaperUri, &dark_uri),
            ThemeMode::Light => (SettingKey::LightWallpaperUri, &light_uri),
        };
        if active_uri.trim().is_empty() {
            return Err(AccentError::SourceUnavailable(format!(
                "{active_key} is unset ({theme} theme)"
            )));
        }

        let source = resolve_active_wallpaper(theme, &light_uri, &dark_uri)?;
        Ok((theme, source))
    }

    async fn convert(&self, input: &Path) -> Result<PathBuf, AccentError> {
        let converter = &self.tools.converter;
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| {
                AccentError::Conversion(ProcessError::Spawn {
                    program: converter.program.clone(),
                    message: format!(
                        "cannot create cache directory {}: {e}",
                        self.cache_dir.display()
                    ),
                })
            })?;

        let output = self.converted_path();
        let args = converter.render_args(
            &input.to_string_lossy(),
            Some(output.to_string_lossy().as_ref()),
        );
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            "converting wallpaper to raster"
        );
        run_checked(self.runner.as_ref(), &converter.program, &args)
            .await
            .map_err(AccentError::Conversion)?;
        Ok(output)
    }

    async fn sample(&self, raster: &Path) -> Result<Rgb, AccentError> {
        let sampler = &self.tools.sampler;
        let args = sampler.render_args(&raster.to_string_lossy(), None);
        let output = run_checked(self.runner.as_ref(), &sampler.program, &args)
            .await
            .map_err(AccentError::Sampling)?;
        tracing::debug!(raw = %output.stdout.trim(), "sampler output");
        let sample = parse_sample_output(&output.stdout)?;
        tracing::debug!(r = sample.r, g = sample.g, b = sample.b, "parsed wallpaper color");
        Ok(sample)
    }

    async fn apply(&self, accent: &str) -> Result<ApplyOutcome, AccentError> {
        if self.dry_run {
            tracing::info!(accent, "dry run; accent not written");
            return Ok(ApplyOutcome::DryRun);
        }
        match self.settings.get(SettingKey::AccentColor).await {
            Ok(current) if current == accent => return Ok(ApplyOutcome::Unchanged),
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "could not read current accent"),
        }
        self.settings.set(SettingKey::AccentColor, accent).await?;
        Ok(ApplyOutcome::Written)
    }
}

fn log_report(report: &RunReport) {
    tracing::info!(
        accent = %report.accent,
        sample = %report.sample,
        converted = report.converted(),
        outcome = ?report.outcome,
        "accent evaluated"
    );
}

/// Log a failed run with its stage; the accent is left as it was.
pub fn log_failure(failure: &RunFailure) {
    tracing::warn!(
        stage = %failure.stage,
        error = %failure.error,
        "accent run failed; accent left unchanged"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteEntry;
    use crate::testsupport::{MemorySettings, ScriptedRunner, TestTempDir};

    struct Fixture {
        settings: Arc<MemorySettings>,
        runner: Arc<ScriptedRunner>,
        config: Config,
        _cache: TestTempDir,
    }

    impl Fixture {
        fn new(color_scheme: &str, light_uri: &str, dark_uri: &str) -> Self {
            let cache = TestTempDir::new("pipeline");
            let mut config = Config::default();
            config.runtime.cache_dir = cache.child("cache");
            config.palette = Palette::new(vec![
                PaletteEntry::new("blue", Rgb::new(53, 131, 227)),
                PaletteEntry::new("red", Rgb::new(230, 45, 66)),
            ]);
            Self {
                settings: Arc::new(MemorySettings::with_wallpapers(
                    color_scheme,
                    light_uri,
                    dark_uri,
                )),
                runner: Arc::new(ScriptedRunner::new()),
                config,
                _cache: cache,
            }
        }

        fn pipeline(&self) -> AccentPipeline {
            AccentPipeline::new(&self.config, self.settings.clone(), self.runner.clone())
        }
    }

    #[tokio::test]
    async fn raster_wallpaper_is_sampled_directly_and_applied() {
        let fx = Fixture::new("default", "file:///walls/sea.jpg", "file:///walls/night.png");
        fx.runner.respond("magick", 0, "(50, 130, 225)\n");

        let report = fx.pipeline().run().await.unwrap();
        assert_eq!(report.accent, "blue");
        assert_eq!(report.theme, ThemeMode::Light);
        assert_eq!(report.outcome, ApplyOutcome::Written);
        assert!(!report.converted());
        assert_eq!(
            fx.settings.writes(),
            vec![(SettingKey::AccentColor, "blue".to_string())]
        );
        let calls = fx.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][1], "/walls/sea.jpg");
    }

    #[tokio::test]
    async fn dark_theme_svg_goes_through_converter() {
        let fx = Fixture::new("prefer-dark", "file:///walls/day.jpg", "file:///walls/blobs-d.svg");
        fx.runner.respond("magick", 0, "");
        fx.runner.respond("magick", 0, "(240, 40, 70)");

        let pipeline = fx.pipeline();
        let report = pipeline.run().await.unwrap();
        assert_eq!(report.accent, "red");
        assert!(report.converted());
        assert_eq!(report.raster_path, pipeline.converted_path());
        assert!(fx.config.runtime.cache_dir.is_dir(), "cache dir created");

        let calls = fx.runner.calls();
        let converted = pipeline.converted_path().to_string_lossy().into_owned();
        assert_eq!(calls[0], ["magick", "/walls/blobs-d.svg", converted.as_str()]);
        assert_eq!(calls[1][1], converted);
    }

    #[tokio::test]
    async fn unparsable_sample_leaves_accent_untouched() {
        let fx = Fixture::new("default", "file:///walls/sea.jpg", "");
        fx.settings.put(SettingKey::AccentColor, "slate");
        fx.runner.respond("magick", 0, "garbage");

        let failure = fx.pipeline().run().await.unwrap_err();
        assert_eq!(failure.stage, Stage::Sampling);
        assert!(matches!(failure.error, AccentError::SampleParse(_)));
        assert!(fx.settings.writes().is_empty());
        assert_eq!(
            fx.settings.value(SettingKey::AccentColor).as_deref(),
            Some("slate")
        );
    }

    #[tokio::test]
    async fn converter_failure_aborts_before_sampling() {
        let fx = Fixture::new("default", "file:///walls/art.jxl", "");
        fx.runner
            .respond_with_stderr("magick", 1, "no decode delegate for this image format");

        let failure = fx.pipeline().run().await.unwrap_err();
        assert_eq!(failure.stage, Stage::Converting);
        assert!(matches!(failure.error, AccentError::Conversion(_)));
        assert_eq!(fx.runner.calls_to("magick"), 1);
        assert!(fx.settings.writes().is_empty());
    }

    #[tokio::test]
    async fn converter_timeout_is_a_conversion_error() {
        let fx = Fixture::new("default", "file:///walls/art.svg", "");
        fx.runner.respond_timeout("magick");

        let failure = fx.pipeline().run().await.unwrap_err();
        assert!(matches!(
            failure.error,
            AccentError::Conversion(ProcessError::TimedOut { .. })
        ));
    }

    #[tokio::test]
    async fn unset_active_uri_is_source_unavailable() {
        let fx = Fixture::new("prefer-dark", "file:///walls/day.jpg", "");
        let failure = fx.pipeline().run().await.unwrap_err();
        assert_eq!(failure.stage, Stage::ResolvingSource);
        assert!(matches!(failure.error, AccentError::SourceUnavailable(_)));
        assert!(fx.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn extensionless_path_is_invalid() {
        let fx = Fixture::new("default", "file:///walls/wallpaper", "");
        let failure = fx.pipeline().run().await.unwrap_err();
        assert!(matches!(failure.error, AccentError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn sampler_exit_failure_is_reported_at_sampling() {
        let fx = Fixture::new("default", "file:///walls/sea.png", "");
        fx.runner.respond_with_stderr("magick", 1, "unable to open image");
        let failure = fx.pipeline().run().await.unwrap_err();
        assert_eq!(failure.stage, Stage::Sampling);
        assert!(matches!(failure.error, AccentError::Sampling(_)));
    }

    #[tokio::test]
    async fn empty_palette_fails_at_matching() {
        let mut fx = Fixture::new("default", "file:///walls/sea.png", "");
        fx.config.palette = Palette::new(Vec::new());
        fx.runner.respond("magick", 0, "(1, 2, 3)");
        let failure = fx.pipeline().run().await.unwrap_err();
        assert_eq!(failure.stage, Stage::Matching);
        assert!(matches!(failure.error, AccentError::Configuration(_)));
    }

    #[tokio::test]
    async fn same_accent_is_not_rewritten() {
        let fx = Fixture::new("default", "file:///walls/sea.png", "");
        fx.settings.put(SettingKey::AccentColor, "blue");
        fx.runner.respond("magick", 0, "(50, 130, 225)");
        let report = fx.pipeline().run().await.unwrap();
        assert_eq!(report.outcome, ApplyOutcome::Unchanged);
        assert!(fx.settings.writes().is_empty());
    }

    #[tokio::test]
    async fn dry_run_never_writes() {
        let fx = Fixture::new("default", "file:///walls/sea.png", "");
        fx.runner.respond("magick", 0, "(145, 85, 145)");
        let report = fx.pipeline().with_dry_run(true).run().await.unwrap();
        assert_eq!(report.accent, "red");
        assert_eq!(report.outcome, ApplyOutcome::DryRun);
        assert!(fx.settings.writes().is_empty());
    }

    #[tokio::test]
    async fn observer_sees_full_stage_sequence() {
        let fx = Fixture::new("default", "file:///walls/a.svg", "");
        fx.runner.respond("magick", 0, "");
        fx.runner.respond("magick", 0, "(1, 2, 3)");
        let mut stages = Vec::new();
        fx.pipeline()
            .run_observed(|stage| stages.push(stage))
            .await
            .unwrap();
        assert_eq!(
            stages,
            [
                Stage::ResolvingSource,
                Stage::Converting,
                Stage::Sampling,
                Stage::Matching,
                Stage::Applying,
                Stage::Idle
            ]
        );
    }

    #[tokio::test]
    async fn failed_run_reports_failed_then_idle() {
        let fx = Fixture::new("default", "file:///walls/a.png", "");
        fx.runner.respond("magick", 0, "nope");
        let mut stages = Vec::new();
        let result = fx.pipeline().run_observed(|stage| stages.push(stage)).await;
        assert!(result.is_err());
        assert_eq!(
            stages,
            [
                Stage::ResolvingSource,
                Stage::Sampling,
                Stage::Failed,
                Stage::Idle
            ]
        );
    }

    #[tokio::test]
    async fn run_logged_swallows_failures() {
        let fx = Fixture::new("default", "", "");
        assert!(fx.pipeline().run_logged().await.is_none());
        assert!(fx.settings.writes().is_empty());
    }

    #[test]
    fn stage_names_are_kebab_case() {
        assert_eq!(Stage::ResolvingSource.to_string(), "resolving-source");
        assert_eq!(
            serde_json::to_string(&Stage::ResolvingSource).unwrap(),
            "\"resolving-source\""
        );
    }
}
