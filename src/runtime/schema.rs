//! Runtime command/event schema.
//!
//! Frontends drive the watch runtime with [`RuntimeCommand`]s and observe it
//! through a stream of [`RuntimeEventEnvelope`]s.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::palette::Rgb;
use crate::pipeline::{ApplyOutcome, Stage};
use crate::settings::SettingKey;

/// Why the accent is being re-evaluated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReevaluationTrigger {
    /// First evaluation when the runtime starts.
    Startup,
    /// `picture-uri` changed while the light theme is active.
    LightWallpaperChanged,
    /// `picture-uri-dark` changed while the dark theme is active.
    DarkWallpaperChanged,
    /// `color-scheme` flipped and the two wallpapers differ.
    ColorSchemeChanged,
    /// Explicit request from the frontend.
    Manual,
}

impl fmt::Display for ReevaluationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Startup => "startup",
            Self::LightWallpaperChanged => "light-wallpaper-changed",
            Self::DarkWallpaperChanged => "dark-wallpaper-changed",
            Self::ColorSchemeChanged => "color-scheme-changed",
            Self::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// A setting reported as changed by the subscription source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingChange {
    pub key: SettingKey,
    /// New value, already unquoted.
    pub value: String,
}

/// Control-plane commands for the runtime actor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RuntimeCommand {
    Reevaluate,
    Shutdown,
}

/// Monotonic envelope for runtime events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeEventEnvelope {
    pub seq: u64,
    pub ts_unix_ms: u64,
    pub event: RuntimeEvent,
}

impl RuntimeEventEnvelope {
    pub fn new(seq: u64, event: RuntimeEvent) -> Self {
        Self {
            seq,
            ts_unix_ms: now_unix_millis(),
            event,
        }
    }
}

/// Typed runtime event families.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum RuntimeEvent {
    Lifecycle(LifecycleEvent),
    Trigger(TriggerEvent),
    Run(RunEvent),
}

/// Runtime lifecycle milestones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    RuntimeStarted,
    /// The settings subscription ended; no further changes will arrive.
    SettingsStreamClosed,
    RuntimeStopped,
}

/// Outcome of classifying a settings change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    Accepted { trigger: ReevaluationTrigger },
    Ignored { key: SettingKey, reason: String },
}

/// Progress of one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    Started {
        run_id: u64,
        trigger: ReevaluationTrigger,
    },
    Stage {
        run_id: u64,
        stage: Stage,
    },
    Succeeded {
        run_id: u64,
        accent: String,
        sample: Rgb,
        outcome: ApplyOutcome,
    },
    Failed {
        run_id: u64,
        stage: Stage,
        message: String,
    },
    /// A newer trigger aborted this run before it applied anything.
    Superseded { run_id: u64 },
}

fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
