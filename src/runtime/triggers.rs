//! Settings change → re-evaluation decision.

use crate::error::AccentError;
use crate::settings::{SettingKey, SettingsProvider};
use crate::source::ThemeMode;

use super::schema::{ReevaluationTrigger, SettingChange};

/// Result of classifying one settings change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Trigger(ReevaluationTrigger),
    Ignore(String),
}

/// Decides which settings changes can alter the accent.
///
/// Tracks the last seen theme mode so switching between two light schemes
/// (`default` ↔ `prefer-light`) does not count as a theme change.
#[derive(Debug, Default)]
pub struct TriggerClassifier {
    last_theme: Option<ThemeMode>,
}

impl TriggerClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the theme mode at startup.
    pub fn prime(&mut self, theme: ThemeMode) {
        self.last_theme = Some(theme);
    }

    pub async fn classify(
        &mut self,
        change: &SettingChange,
        settings: &dyn SettingsProvider,
    ) -> Result<Classification, AccentError> {
        match change.key {
            SettingKey::LightWallpaperUri => {
                let theme = current_theme(settings).await?;
                Ok(match theme {
                    ThemeMode::Light => {
                        Classification::Trigger(ReevaluationTrigger::LightWallpaperChanged)
                    }
                    ThemeMode::Dark => {
                        Classification::Ignore("light wallpaper is not active".into())
                    }
                })
            }
            SettingKey::DarkWallpaperUri => {
                let theme = current_theme(settings).await?;
                Ok(match theme {
                    ThemeMode::Dark => {
                        Classification::Trigger(ReevaluationTrigger::DarkWallpaperChanged)
                    }
                    ThemeMode::Light => {
                        Classification::Ignore("dark wallpaper is not active".into())
                    }
                })
            }
            SettingKey::ColorScheme => {
                let theme = ThemeMode::from_color_scheme(&change.value);
                let previous = self.last_theme.replace(theme);
                if previous == Some(theme) {
                    return Ok(Classification::Ignore(format!(
                        "theme mode is still {theme}"
                    )));
                }
                // The flip is already recorded, so an unreadable URI must not
                // swallow it; the run re-reads both settings anyway.
                match wallpapers_identical(settings).await {
                    Ok(true) => Ok(Classification::Ignore(
                        "light and dark wallpapers are identical".into(),
                    )),
                    Ok(false) => Ok(Classification::Trigger(
                        ReevaluationTrigger::ColorSchemeChanged,
                    )),
                    Err(e) => {
                        tracing::debug!(error = %e, "wallpaper URIs unreadable; re-evaluating");
                        Ok(Classification::Trigger(
                            ReevaluationTrigger::ColorSchemeChanged,
                        ))
                    }
                }
            }
            SettingKey::AccentColor => Ok(Classification::Ignore(
                "accent changes do not affect the wallpaper".into(),
            )),
        }
    }
}

async fn wallpapers_identical(settings: &dyn SettingsProvider) -> Result<bool, AccentError> {
    let light = settings.get(SettingKey::LightWallpaperUri).await?;
    let dark = settings.get(SettingKey::DarkWallpaperUri).await?;
    Ok(light == dark)
}

async fn current_theme(settings: &dyn SettingsProvider) -> Result<ThemeMode, AccentError> {
    let scheme = settings.get(SettingKey::ColorScheme).await?;
    Ok(ThemeMode::from_color_scheme(&scheme))
}
