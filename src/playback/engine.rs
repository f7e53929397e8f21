//! Playback engine implementation
//!
//! Runs each script on its own task. Control calls (`start`, `pause`,
//! `resume`, `stop`) may come from any thread; they flip shared state that
//! the run observes at every action boundary and inside every wait.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{LoopMode, PlaybackState, PlaybackStatus};
use crate::data::{Action, Script};
use crate::error::{MacroError, Result};
use crate::input::InputActionSink;

const STATUS_CAPACITY: usize = 64;

/// The run was cancelled by `stop()`
struct Cancelled;

type Step = std::result::Result<(), Cancelled>;

struct RunState {
    state: PlaybackState,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// State shared between the control surface and the running task
struct Shared {
    run: Mutex<RunState>,
    /// Pause gate: `true` lets the run proceed
    gate: watch::Sender<bool>,
    status_tx: broadcast::Sender<PlaybackStatus>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.run.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Broadcast a status update. Never blocks; missing listeners are fine.
    fn notify(&self, status: PlaybackStatus) {
        let _ = self.status_tx.send(status);
    }

    fn finish(&self, cancelled: bool, passes: u32, elapsed: Duration) {
        let mut run = self.lock();

        let status = if cancelled || run.state == PlaybackState::Stopping {
            PlaybackStatus::Stopped
        } else {
            PlaybackStatus::Completed { passes }
        };

        run.state = PlaybackState::Idle;
        run.task = None;
        self.gate.send_replace(true);

        info!(passes, elapsed_ms = elapsed.as_millis() as u64, "Playback {}", status);
        self.notify(status);
    }
}

/// Replays scripts through an input sink
pub struct PlaybackEngine {
    shared: Arc<Shared>,
    sink: Arc<dyn InputActionSink>,
    runtime: Handle,
}

impl PlaybackEngine {
    /// Create an engine whose runs are spawned on `runtime`
    pub fn new(sink: Arc<dyn InputActionSink>, runtime: Handle) -> Self {
        let (gate, _) = watch::channel(true);
        let (status_tx, _) = broadcast::channel(STATUS_CAPACITY);

        let shared = Arc::new(Shared {
            run: Mutex::new(RunState {
                state: PlaybackState::Idle,
                cancel: CancellationToken::new(),
                task: None,
            }),
            gate,
            status_tx,
        });

        Self {
            shared,
            sink,
            runtime,
        }
    }

    /// Subscribe to status updates
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackStatus> {
        self.shared.status_tx.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.lock().state
    }

    /// Start replaying `script`. Fails with `AlreadyRunning` unless idle;
    /// the active run is left untouched in that case.
    pub fn start(&self, script: Arc<Script>, mode: LoopMode) -> Result<()> {
        let mut run = self.shared.lock();
        if run.state != PlaybackState::Idle {
            return Err(MacroError::AlreadyRunning);
        }

        run.state = PlaybackState::Running;
        run.cancel = CancellationToken::new();
        self.shared.gate.send_replace(true);
        self.shared.notify(PlaybackStatus::Started);

        let run_id = Uuid::new_v4();
        let runner = Runner {
            shared: self.shared.clone(),
            sink: self.sink.clone(),
            script,
            cancel: run.cancel.clone(),
            gate: self.shared.gate.subscribe(),
        };
        let span = info_span!("playback", run = %run_id);
        run.task = Some(self.runtime.spawn(runner.run(mode).instrument(span)));

        Ok(())
    }

    /// Suspend the run before its next action. Returns whether it was running.
    pub fn pause(&self) -> bool {
        let mut run = self.shared.lock();
        if run.state != PlaybackState::Running {
            return false;
        }

        run.state = PlaybackState::Paused;
        self.shared.gate.send_replace(false);
        info!("Playback paused");
        self.shared.notify(PlaybackStatus::Paused);
        true
    }

    /// Continue a paused run. Returns whether it was paused.
    pub fn resume(&self) -> bool {
        let mut run = self.shared.lock();
        if run.state != PlaybackState::Paused {
            return false;
        }

        run.state = PlaybackState::Running;
        self.shared.gate.send_replace(true);
        info!("Playback resumed");
        self.shared.notify(PlaybackStatus::Resumed);
        true
    }

    /// Request cancellation of the active run. Returns whether one was active.
    pub fn stop(&self) -> bool {
        let mut run = self.shared.lock();
        if !matches!(run.state, PlaybackState::Running | PlaybackState::Paused) {
            return false;
        }

        run.state = PlaybackState::Stopping;
        run.cancel.cancel();
        info!("Playback stop requested");
        self.shared.notify(PlaybackStatus::Stopping);
        true
    }

    /// Wait for the active run, if any, to end
    pub async fn wait(&self) {
        let task = self.shared.lock().task.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Playback task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One playback run
struct Runner {
    shared: Arc<Shared>,
    sink: Arc<dyn InputActionSink>,
    script: Arc<Script>,
    cancel: CancellationToken,
    gate: watch::Receiver<bool>,
}

impl Runner {
    async fn run(mut self, mode: LoopMode) {
        info!(
            script = %self.script.name,
            actions = self.script.len(),
            ?mode,
            "Playback started"
        );

        let started = Instant::now();
        let mut passes = 0;
        let outcome = self.repeat(mode, started, &mut passes).await;

        self.shared.finish(outcome.is_err(), passes, started.elapsed());
    }

    async fn repeat(&mut self, mode: LoopMode, started: Instant, passes: &mut u32) -> Step {
        if self.script.is_empty() {
            debug!("Script is empty, nothing to play");
            return Ok(());
        }

        loop {
            if let LoopMode::Count(count) = mode {
                if *passes >= count {
                    return Ok(());
                }
            }

            // Deadline is checked after the gate; a pause can outlast it
            self.checkpoint().await?;
            if let LoopMode::Duration(limit) = mode {
                if started.elapsed() >= limit {
                    return Ok(());
                }
            }

            self.execute_once().await?;
            *passes += 1;
            debug!(passes = *passes, "Pass finished");
        }
    }

    async fn execute_once(&mut self) -> Step {
        let script = self.script.clone();

        for (index, action) in script.actions.iter().enumerate() {
            self.checkpoint().await?;
            self.dispatch(index, action).await?;
        }
        Ok(())
    }

    /// Bail out if stopped, then wait for the pause gate to open
    async fn checkpoint(&mut self) -> Step {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        if *self.gate.borrow() {
            return Ok(());
        }

        debug!("Waiting for resume");
        let gate = &mut self.gate;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            opened = async { gate.wait_for(|open| *open).await.is_ok() } => {
                if opened {
                    Ok(())
                } else {
                    Err(Cancelled)
                }
            }
        }
    }

    /// Sleep that ends early when the run is stopped
    async fn sleep(&self, duration: Duration) -> Step {
        if duration.is_zero() {
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    async fn dispatch(&self, index: usize, action: &Action) -> Step {
        debug!(index, %action, "Dispatching");

        let result = match *action {
            Action::Delay { duration_ms } => {
                return self.sleep(Duration::from_millis(duration_ms)).await;
            }
            Action::KeyPress { key_code } => self.sink.key_press(key_code),
            Action::KeyDown { key_code } => self.sink.key_down(key_code),
            Action::KeyUp { key_code } => self.sink.key_up(key_code),
            // A left-down replays as a full click
            Action::MouseClick { x, y } | Action::MouseLeftDown { x, y } => {
                self.sink.click_left(x, y)
            }
            Action::MouseRightDown { x, y } => self.sink.click_right(x, y),
            Action::MouseLongPress { x, y, duration_ms } => {
                self.report(index, action, self.sink.click_left(x, y));
                return self.sleep(Duration::from_millis(duration_ms)).await;
            }
            // The matching down already produced a full click
            Action::MouseLeftUp { .. } | Action::MouseRightUp { .. } => Ok(()),
        };

        self.report(index, action, result);
        Ok(())
    }

    fn report(&self, index: usize, action: &Action, result: anyhow::Result<()>) {
        let Err(e) = result else {
            return;
        };

        let error = MacroError::InjectionFailed {
            action: action.to_string(),
            reason: format!("{:#}", e),
        };
        warn!(index, "{}", error);
        self.shared.notify(PlaybackStatus::InjectionFailed {
            index,
            error: error.to_string(),
        });
    }
}
