//! External process execution with a bounded wait.
//!
//! The converter, the sampler, and the `gsettings` provider all run through
//! [`ProcessRunner`], so tests can substitute scripted output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::error::ProcessError;

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Program plus argument template.
///
/// `{input}` and `{output}` in `args` are substituted at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand placeholders into concrete arguments.
    pub fn render_args(&self, input: &str, output: Option<&str>) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                let arg = arg.replace("{input}", input);
                match output {
                    Some(out) => arg.replace("{output}", out),
                    None => arg,
                }
            })
            .collect()
    }
}

/// Runs external programs to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Spawn `program` with `args` and wait for it to exit.
    ///
    /// A non-zero exit is reported through [`ExecOutput::exit_code`]; only
    /// spawn failures and timeouts are errors here. See [`run_checked`].
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput, ProcessError>;
}

/// Run a process and turn a non-zero exit into [`ProcessError::Failed`].
pub async fn run_checked(
    runner: &dyn ProcessRunner,
    program: &str,
    args: &[String],
) -> Result<ExecOutput, ProcessError> {
    let output = runner.run(program, args).await?;
    ensure_success(program, output)
}

/// Convert non-zero status into an error carrying the captured stderr.
pub fn ensure_success(program: &str, output: ExecOutput) -> Result<ExecOutput, ProcessError> {
    if output.exit_code == 0 {
        return Ok(output);
    }
    let stderr = if output.stderr.trim().is_empty() {
        output.stdout
    } else {
        output.stderr
    };
    Err(ProcessError::Failed {
        program: program.to_string(),
        exit_code: output.exit_code,
        stderr,
    })
}

/// [`ProcessRunner`] backed by `tokio::process` with a per-call time limit.
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    limit: Duration,
}

impl TokioProcessRunner {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput, ProcessError> {
        tracing::debug!(program, ?args, "spawning process");
        match timeout(self.limit, spawn_and_wait(program, args)).await {
            Ok(result) => result,
            // The child future is dropped here; kill_on_drop terminates it.
            Err(_) => Err(ProcessError::TimedOut {
                program: program.to_string(),
                limit: self.limit,
            }),
        }
    }
}

async fn spawn_and_wait(program: &str, args: &[String]) -> Result<ExecOutput, ProcessError> {
    let mut cmd = Command::new(program);
    // Superseded runs are aborted; their children must not outlive them.
    cmd.kill_on_drop(true);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd.spawn().map_err(|e| ProcessError::Spawn {
        program: program.to_string(),
        message: e.to_string(),
    })?;

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| ProcessError::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        })?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Human-oriented duration formatting used in error messages.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    if secs == 0 {
        return format!("{millis}ms");
    }
    if millis == 0 {
        if secs % 3600 == 0 {
            return format!("{}h", secs / 3600);
        }
        if secs % 60 == 0 {
            return format!("{}m", secs / 60);
        }
        return format!("{secs}s");
    }
    format!("{secs}.{millis:03}s")
}
