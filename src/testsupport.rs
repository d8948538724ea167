//! Shared fakes for pipeline, settings, and runtime tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{AccentError, ProcessError};
use crate::process::{ExecOutput, ProcessRunner};
use crate::settings::{SettingKey, SettingsProvider};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("autoaccent-{prefix}-{millis}-{suffix}"));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// In-memory settings store that records writes.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<SettingKey, String>>,
    writes: Mutex<Vec<(SettingKey, String)>>,
    failing: Mutex<HashSet<SettingKey>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a color scheme and both wallpaper URIs.
    pub fn with_wallpapers(color_scheme: &str, light_uri: &str, dark_uri: &str) -> Self {
        let settings = Self::new();
        settings.put(SettingKey::ColorScheme, color_scheme);
        settings.put(SettingKey::LightWallpaperUri, light_uri);
        settings.put(SettingKey::DarkWallpaperUri, dark_uri);
        settings
    }

    /// Seed a value without recording it as a write.
    pub fn put(&self, key: SettingKey, value: &str) {
        self.values.lock().unwrap().insert(key, value.to_string());
    }

    pub fn value(&self, key: SettingKey) -> Option<String> {
        self.values.lock().unwrap().get(&key).cloned()
    }

    pub fn writes(&self) -> Vec<(SettingKey, String)> {
        self.writes.lock().unwrap().clone()
    }

    /// Make reads of `key` fail until cleared, as a stalled daemon would.
    pub fn fail_reads(&self, key: SettingKey, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(key);
        } else {
            set.remove(&key);
        }
    }
}

#[async_trait]
impl SettingsProvider for MemorySettings {
    async fn get(&self, key: SettingKey) -> Result<String, AccentError> {
        if self.failing.lock().unwrap().contains(&key) {
            return Err(AccentError::Settings(format!("reading {key}: timed out")));
        }
        Ok(self.value(key).unwrap_or_default())
    }

    async fn set(&self, key: SettingKey, value: &str) -> Result<(), AccentError> {
        self.put(key, value);
        self.writes.lock().unwrap().push((key, value.to_string()));
        Ok(())
    }
}

enum Scripted {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
        delay: Duration,
    },
    TimedOut,
}

/// [`ProcessRunner`] returning queued responses per program name.
///
/// Every call is recorded as `[program, args...]`. Calling a program with no
/// queued response yields a spawn error.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, program: &str, code: i32, stdout: &str) {
        self.push(program, code, stdout, "", Duration::ZERO);
    }

    pub fn respond_with_stderr(&self, program: &str, code: i32, stderr: &str) {
        self.push(program, code, "", stderr, Duration::ZERO);
    }

    /// Respond successfully after sleeping for `delay`.
    pub fn respond_after(&self, program: &str, delay: Duration, stdout: &str) {
        self.push(program, 0, stdout, "", delay);
    }

    pub fn respond_timeout(&self, program: &str) {
        self.queue(program, Scripted::TimedOut);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.first().is_some_and(|p| p == program))
            .count()
    }

    fn push(&self, program: &str, code: i32, stdout: &str, stderr: &str, delay: Duration) {
        self.queue(
            program,
            Scripted::Exit {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                delay,
            },
        );
    }

    fn queue(&self, program: &str, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry(program.to_string())
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput, ProcessError> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().cloned());
        self.calls.lock().unwrap().push(call);

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(program)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Scripted::Exit {
                code,
                stdout,
                stderr,
                delay,
            }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(ExecOutput {
                    exit_code: code,
                    stdout,
                    stderr,
                })
            }
            Some(Scripted::TimedOut) => Err(ProcessError::TimedOut {
                program: program.to_string(),
                limit: Duration::from_secs(10),
            }),
            None => Err(ProcessError::Spawn {
                program: program.to_string(),
                message: "no scripted response".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
    }

    #[tokio::test]
    async fn scripted_runner_replays_in_order_then_fails() {
        let runner = ScriptedRunner::new();
        runner.respond("tool", 0, "first");
        runner.respond("tool", 2, "second");

        assert_eq!(runner.run("tool", &[]).await.unwrap().stdout, "first");
        assert_eq!(runner.run("tool", &[]).await.unwrap().exit_code, 2);
        assert!(runner.run("tool", &[]).await.is_err());
        assert_eq!(runner.calls_to("tool"), 3);
    }

    #[tokio::test]
    async fn memory_settings_records_writes_only() {
        let settings = MemorySettings::with_wallpapers("default", "file:///a.png", "file:///b.png");
        assert!(settings.writes().is_empty());
        settings.set(SettingKey::AccentColor, "blue").await.unwrap();
        assert_eq!(
            settings.writes(),
            vec![(SettingKey::AccentColor, "blue".to_string())]
        );
        assert_eq!(settings.get(SettingKey::AccentColor).await.unwrap(), "blue");
    }

    #[tokio::test]
    async fn memory_settings_can_fail_reads() {
        let settings = MemorySettings::with_wallpapers("default", "file:///a.png", "file:///b.png");
        settings.fail_reads(SettingKey::DarkWallpaperUri, true);
        assert!(settings.get(SettingKey::DarkWallpaperUri).await.is_err());
        assert!(settings.get(SettingKey::LightWallpaperUri).await.is_ok());
        settings.fail_reads(SettingKey::DarkWallpaperUri, false);
        assert_eq!(
            settings.get(SettingKey::DarkWallpaperUri).await.unwrap(),
            "file:///b.png"
        );
    }
}
