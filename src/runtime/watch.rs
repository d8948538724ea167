//! Settings change subscription via `gsettings monitor`.

use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ProcessError;
use crate::settings::{unquote_gvariant_string, SettingKey, BACKGROUND_SCHEMA, INTERFACE_SCHEMA};

use super::schema::SettingChange;

/// Running `gsettings monitor` children. Dropping it stops them.
pub struct SettingsMonitor {
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for SettingsMonitor {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// What a per-schema reader reports to the forwarder.
enum MonitorMessage {
    Change(SettingChange),
    Exited(&'static str),
}

/// Watch the background and interface schemas, forwarding relevant keys.
///
/// The returned stream ends as soon as either monitor stops, so a consumer
/// never keeps waiting on a half-dead subscription.
pub fn spawn_gsettings_monitor(
    program: &str,
) -> Result<(SettingsMonitor, mpsc::UnboundedReceiver<SettingChange>), ProcessError> {
    let (inner_tx, mut inner_rx) = mpsc::unbounded_channel();
    let mut monitor = SettingsMonitor { tasks: Vec::new() };
    for schema in [BACKGROUND_SCHEMA, INTERFACE_SCHEMA] {
        // On error `monitor` drops here and aborts readers already started.
        monitor
            .tasks
            .push(spawn_schema_monitor(program, schema, inner_tx.clone())?);
    }
    drop(inner_tx);

    let (tx, rx) = mpsc::unbounded_channel();
    monitor.tasks.push(tokio::spawn(async move {
        while let Some(message) = inner_rx.recv().await {
            match message {
                MonitorMessage::Change(change) => {
                    if tx.send(change).is_err() {
                        break;
                    }
                }
                MonitorMessage::Exited(schema) => {
                    tracing::warn!(schema, "settings monitor stopped; closing change stream");
                    break;
                }
            }
        }
    }));
    Ok((monitor, rx))
}

fn spawn_schema_monitor(
    program: &str,
    schema: &'static str,
    tx: mpsc::UnboundedSender<MonitorMessage>,
) -> Result<JoinHandle<()>, ProcessError> {
    let mut child = Command::new(program)
        .args(["monitor", schema])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ProcessError::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        })?;
    let stdout = child.stdout.take().ok_or_else(|| ProcessError::Spawn {
        program: program.to_string(),
        message: "monitor stdout was not captured".into(),
    })?;

    Ok(tokio::spawn(async move {
        // Keep the child alive for as long as the reader runs.
        let _child = child;
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(change) = parse_monitor_line(schema, &line) else {
                        continue;
                    };
                    if tx.send(MonitorMessage::Change(change)).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(schema, error = %e, "settings monitor read failed");
                    break;
                }
            }
        }
        let _ = tx.send(MonitorMessage::Exited(schema));
    }))
}

/// Parse one `key: value` line printed by `gsettings monitor <schema>`.
///
/// Keys this crate does not track yield `None`.
pub fn parse_monitor_line(schema: &str, line: &str) -> Option<SettingChange> {
    let (key, value) = line.split_once(':')?;
    let key = SettingKey::from_schema_key(schema, key.trim())?;
    Some(SettingChange {
        key,
        value: unquote_gvariant_string(value),
    })
}
