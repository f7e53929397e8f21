//! Application loop - routes control commands to recording and playback
//!
//! Owns the current script, the capture session and the playback engine.
//! Everything here runs on one task; capture and playback report back over
//! channels.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::capture::EventCapture;
use crate::config::Config;
use crate::control::ControlCommand;
use crate::data::{Action, Script};
use crate::playback::{LoopMode, PlaybackEngine, PlaybackState, PlaybackStatus};

/// Commands accepted by the application loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Control(ControlCommand),
    /// Stop everything and exit the loop
    Shutdown,
}

impl From<ControlCommand> for AppCommand {
    fn from(command: ControlCommand) -> Self {
        AppCommand::Control(command)
    }
}

pub struct App {
    script: Script,
    /// Where the script is saved after recording. `None` picks a path from the script name.
    script_path: Option<PathBuf>,
    config: Config,
    loop_mode: LoopMode,
    capture: EventCapture,
    playback: PlaybackEngine,
    cmd_rx: mpsc::UnboundedReceiver<AppCommand>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    status_rx: broadcast::Receiver<PlaybackStatus>,
}

impl App {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        script: Script,
        script_path: Option<PathBuf>,
        config: Config,
        loop_mode: LoopMode,
        capture: EventCapture,
        playback: PlaybackEngine,
        cmd_rx: mpsc::UnboundedReceiver<AppCommand>,
        action_rx: mpsc::UnboundedReceiver<Action>,
    ) -> Self {
        let status_rx = playback.subscribe();
        Self {
            script,
            script_path,
            config,
            loop_mode,
            capture,
            playback,
            cmd_rx,
            action_rx,
            status_rx,
        }
    }

    /// Run until shutdown. Returns the final script.
    pub async fn run(mut self) -> Result<Script> {
        info!(
            script = %self.script.name,
            actions = self.script.len(),
            mode = ?self.loop_mode,
            "Ready"
        );

        loop {
            tokio::select! {
                Some(action) = self.action_rx.recv() => {
                    self.script.push(action);
                }

                status = self.status_rx.recv() => match status {
                    Ok(status) => info!("Playback status: {}", status),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "Status listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {}
                },

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(AppCommand::Control(command)) => self.handle_control(command).await,
                    Some(AppCommand::Shutdown) | None => {
                        info!("Shutdown requested");
                        break;
                    }
                },
            }
        }

        self.playback.stop();
        self.playback.wait().await;
        if self.capture.is_recording() {
            self.finish_recording().await;
        }

        Ok(self.script)
    }

    async fn handle_control(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::ToggleRun => self.toggle_run(),
            ControlCommand::Stop => {
                if !self.playback.stop() {
                    debug!("Stop requested with nothing playing");
                }
            }
            ControlCommand::ToggleRecord => {
                if self.capture.is_recording() {
                    self.finish_recording().await;
                } else {
                    self.begin_recording();
                }
            }
        }
    }

    fn toggle_run(&mut self) {
        match self.playback.state() {
            PlaybackState::Idle => {
                if self.capture.is_recording() {
                    warn!("Stop recording before starting playback");
                    return;
                }
                let script = Arc::new(self.script.clone());
                if let Err(e) = self.playback.start(script, self.loop_mode) {
                    warn!("Could not start playback: {}", e);
                }
            }
            PlaybackState::Running => {
                self.playback.pause();
            }
            PlaybackState::Paused => {
                self.playback.resume();
            }
            PlaybackState::Stopping => debug!("Playback is stopping, ignoring toggle"),
        }
    }

    fn begin_recording(&mut self) {
        if self.playback.state() != PlaybackState::Idle {
            warn!("Stop playback before recording");
            return;
        }

        let previous = std::mem::replace(&mut self.script, Script::with_timestamp_name());
        if let Err(e) = self.capture.start() {
            error!("Recording did not start: {}", e);
            self.script = previous;
            return;
        }
        info!(script = %self.script.name, "Recording into new script");
    }

    async fn finish_recording(&mut self) {
        self.capture.stop().await;
        while let Ok(action) = self.action_rx.try_recv() {
            self.script.push(action);
        }

        let path = self
            .script_path
            .clone()
            .unwrap_or_else(|| self.config.script_path_for(&self.script.name));

        match self.script.save(&path) {
            Ok(()) => info!(
                actions = self.script.len(),
                "Saved {} to {:?}",
                self.script.name,
                path
            ),
            Err(e) => error!("Failed to save script to {:?}: {}", path, e),
        }
    }
}
