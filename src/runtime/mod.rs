//! Watch runtime: turns settings changes into accent re-evaluations.
//!
//! A single actor task owns all scheduling state. Settings changes are
//! classified into [`ReevaluationTrigger`]s, bursts are debounced, and
//! starting a run aborts any run still in flight, so the most recent trigger
//! is the one whose result is applied.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::pipeline::{log_failure, AccentPipeline, RunFailure, RunReport, Stage};
use crate::settings::{SettingKey, SettingsProvider};
use crate::source::ThemeMode;

mod schema;
mod triggers;
pub mod watch;

pub use schema::*;
pub use triggers::{Classification, TriggerClassifier};

/// Handle for sending commands to a spawned runtime actor.
#[derive(Clone)]
pub struct AccentRuntimeHandle {
    pub commands: mpsc::Sender<RuntimeCommand>,
}

impl AccentRuntimeHandle {
    /// Send one command to the runtime actor.
    pub async fn send(&self, command: RuntimeCommand) -> Result<(), String> {
        self.commands
            .send(command)
            .await
            .map_err(|_| "runtime command channel closed".to_string())
    }
}

/// Event stream receiver returned by [`spawn_runtime`].
pub type RuntimeEventStream = mpsc::UnboundedReceiver<RuntimeEventEnvelope>;

/// Bootstrap inputs for the runtime actor.
pub struct RuntimeSpawnConfig {
    pub pipeline: Arc<AccentPipeline>,
    pub settings: Arc<dyn SettingsProvider>,
    /// Source of settings change notifications.
    pub changes: mpsc::UnboundedReceiver<SettingChange>,
    /// Quiet period before a trigger starts a run.
    pub debounce: Duration,
    /// Evaluate once immediately on startup.
    pub run_on_start: bool,
}

struct ActiveRun {
    run_id: u64,
    handle: JoinHandle<()>,
}

struct PendingTrigger {
    trigger: ReevaluationTrigger,
    deadline: Instant,
}

/// Messages from a spawned run back to the actor, in the order they occurred.
enum RunMessage {
    Stage(u64, Stage),
    Done(u64, Result<RunReport, RunFailure>),
}

struct EventSink {
    tx: mpsc::UnboundedSender<RuntimeEventEnvelope>,
    seq: u64,
}

impl EventSink {
    fn emit(&mut self, event: RuntimeEvent) {
        let _ = self.tx.send(RuntimeEventEnvelope::new(self.seq, event));
        self.seq = self.seq.saturating_add(1);
    }
}

/// Spawn the runtime actor.
///
/// The actor stops on [`RuntimeCommand::Shutdown`] or when every command
/// handle has been dropped; any in-flight run is aborted.
pub fn spawn_runtime(config: RuntimeSpawnConfig) -> (AccentRuntimeHandle, RuntimeEventStream) {
    let (command_tx, mut command_rx) = mpsc::channel::<RuntimeCommand>(16);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RuntimeEventEnvelope>();

    tokio::spawn(async move {
        let RuntimeSpawnConfig {
            pipeline,
            settings,
            mut changes,
            debounce,
            run_on_start,
        } = config;
        let (run_tx, mut run_rx) = mpsc::unbounded_channel::<RunMessage>();

        let mut events = EventSink {
            tx: event_tx,
            seq: 0,
        };
        let mut next_run_id: u64 = 1;
        let mut active: Option<ActiveRun> = None;
        let mut pending: Option<PendingTrigger> = None;
        let mut changes_open = true;
        let mut classifier = TriggerClassifier::new();
        match settings.get(SettingKey::ColorScheme).await {
            Ok(scheme) => classifier.prime(ThemeMode::from_color_scheme(&scheme)),
            Err(e) => tracing::debug!(error = %e, "could not read initial color scheme"),
        }

        events.emit(RuntimeEvent::Lifecycle(LifecycleEvent::RuntimeStarted));
        if run_on_start {
            pending = Some(PendingTrigger {
                trigger: ReevaluationTrigger::Startup,
                deadline: Instant::now(),
            });
        }

        loop {
            let deadline = pending.as_ref().map(|p| p.deadline);
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(RuntimeCommand::Reevaluate) => {
                        schedule(&mut pending, ReevaluationTrigger::Manual, debounce, &mut events);
                    }
                    Some(RuntimeCommand::Shutdown) | None => {
                        if let Some(run) = active.take() {
                            run.handle.abort();
                        }
                        events.emit(RuntimeEvent::Lifecycle(LifecycleEvent::RuntimeStopped));
                        break;
                    }
                },
                change = changes.recv(), if changes_open => match change {
                    Some(change) => {
                        tracing::debug!(key = %change.key, value = %change.value, "setting changed");
                        match classifier.classify(&change, settings.as_ref()).await {
                            Ok(Classification::Trigger(trigger)) => {
                                schedule(&mut pending, trigger, debounce, &mut events);
                            }
                            Ok(Classification::Ignore(reason)) => {
                                tracing::debug!(key = %change.key, %reason, "change ignored");
                                events.emit(RuntimeEvent::Trigger(TriggerEvent::Ignored {
                                    key: change.key,
                                    reason,
                                }));
                            }
                            Err(e) => {
                                tracing::warn!(key = %change.key, error = %e, "could not classify change");
                                events.emit(RuntimeEvent::Trigger(TriggerEvent::Ignored {
                                    key: change.key,
                                    reason: e.to_string(),
                                }));
                            }
                        }
                    }
                    None => {
                        tracing::warn!("settings change stream closed; changes are no longer watched");
                        changes_open = false;
                        events.emit(RuntimeEvent::Lifecycle(LifecycleEvent::SettingsStreamClosed));
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let Some(PendingTrigger { trigger, .. }) = pending.take() else {
                        continue;
                    };
                    if let Some(previous) = active.take() {
                        supersede(previous, &mut events);
                    }
                    let run_id = next_run_id;
                    next_run_id += 1;
                    tracing::info!(run_id, %trigger, "re-evaluating accent");
                    events.emit(RuntimeEvent::Run(RunEvent::Started { run_id, trigger }));
                    let handle = spawn_run(pipeline.clone(), run_id, run_tx.clone());
                    active = Some(ActiveRun { run_id, handle });
                }
                Some(message) = run_rx.recv() => match message {
                    RunMessage::Stage(run_id, stage) => {
                        if active.as_ref().is_some_and(|run| run.run_id == run_id) {
                            events.emit(RuntimeEvent::Run(RunEvent::Stage { run_id, stage }));
                        }
                    }
                    RunMessage::Done(run_id, result) => {
                        if active.as_ref().is_some_and(|run| run.run_id == run_id) {
                            active = None;
                        }
                        events.emit(RuntimeEvent::Run(run_finished_event(run_id, result)));
                    }
                },
            }
        }
    });

    (
        AccentRuntimeHandle {
            commands: command_tx,
        },
        event_rx,
    )
}

/// Replace any pending trigger and restart the debounce window.
fn schedule(
    pending: &mut Option<PendingTrigger>,
    trigger: ReevaluationTrigger,
    debounce: Duration,
    events: &mut EventSink,
) {
    events.emit(RuntimeEvent::Trigger(TriggerEvent::Accepted { trigger }));
    *pending = Some(PendingTrigger {
        trigger,
        deadline: Instant::now() + debounce,
    });
}

fn supersede(run: ActiveRun, events: &mut EventSink) {
    // A finished task already sent its result; aborting it is a no-op.
    if run.handle.is_finished() {
        return;
    }
    run.handle.abort();
    tracing::info!(run_id = run.run_id, "superseded in-flight run");
    events.emit(RuntimeEvent::Run(RunEvent::Superseded { run_id: run.run_id }));
}

fn spawn_run(
    pipeline: Arc<AccentPipeline>,
    run_id: u64,
    tx: mpsc::UnboundedSender<RunMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = pipeline
            .run_observed(|stage| {
                let _ = tx.send(RunMessage::Stage(run_id, stage));
            })
            .await;
        let _ = tx.send(RunMessage::Done(run_id, result));
    })
}

fn run_finished_event(run_id: u64, result: Result<RunReport, RunFailure>) -> RunEvent {
    match result {
        Ok(report) => {
            tracing::info!(
                run_id,
                accent = %report.accent,
                sample = %report.sample,
                outcome = ?report.outcome,
                "accent evaluated"
            );
            RunEvent::Succeeded {
                run_id,
                accent: report.accent,
                sample: report.sample,
                outcome: report.outcome,
            }
        }
        Err(failure) => {
            log_failure(&failure);
            RunEvent::Failed {
                run_id,
                stage: failure.stage,
                message: failure.error.to_string(),
            }
        }
    }
}
