//! Control keys that drive recording and playback from anywhere on the desktop

use anyhow::Result;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::data::{RawEventKind, RawInputEvent};
use crate::input::InputEventSource;

/// Commands produced by control keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Start playback, or pause/resume a running one
    ToggleRun,
    /// Stop playback
    Stop,
    /// Start or stop recording
    ToggleRecord,
}

/// The three designated control key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlKeys {
    pub toggle_run: u32,
    pub stop: u32,
    pub toggle_record: u32,
}

impl ControlKeys {
    /// Whether `code` is one of the control keys
    pub fn contains(&self, code: u32) -> bool {
        code == self.toggle_run || code == self.stop || code == self.toggle_record
    }

    pub fn command_for(&self, code: u32) -> Option<ControlCommand> {
        if code == self.toggle_run {
            Some(ControlCommand::ToggleRun)
        } else if code == self.stop {
            Some(ControlCommand::Stop)
        } else if code == self.toggle_record {
            Some(ControlCommand::ToggleRecord)
        } else {
            None
        }
    }
}

/// Turns control key presses into commands
///
/// A held key produces one command until it is released, so OS auto-repeat
/// doesn't toggle a run on and off.
pub struct HotkeyDispatcher {
    keys: ControlKeys,
    held: HashSet<u32>,
}

impl HotkeyDispatcher {
    pub fn new(keys: ControlKeys) -> Self {
        Self {
            keys,
            held: HashSet::new(),
        }
    }

    /// Feed one raw notification, returning the command it triggers
    pub fn observe(&mut self, event: &RawInputEvent) -> Option<ControlCommand> {
        match event.kind {
            RawEventKind::KeyDown(code) => {
                let command = self.keys.command_for(code)?;
                self.held.insert(code).then_some(command)
            }
            RawEventKind::KeyUp(code) => {
                self.held.remove(&code);
                None
            }
            _ => None,
        }
    }

    /// Subscribe to `source` and forward commands on `tx` until the source
    /// or the receiver goes away
    pub fn spawn<C>(
        mut self,
        mut source: Box<dyn InputEventSource>,
        tx: mpsc::UnboundedSender<C>,
    ) -> Result<JoinHandle<()>>
    where
        C: From<ControlCommand> + Send + 'static,
    {
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
        source.start(raw_tx)?;
        info!(keys = ?self.keys, "Control keys active");

        Ok(tokio::spawn(async move {
            while let Some(event) = raw_rx.recv().await {
                if let Some(command) = self.observe(&event) {
                    debug!(?command, "Control key pressed");
                    if tx.send(command.into()).is_err() {
                        break;
                    }
                }
            }
            source.stop();
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::mock::ChannelSource;
    use std::time::Instant;

    const KEYS: ControlKeys = ControlKeys {
        toggle_run: 120,
        stop: 121,
        toggle_record: 122,
    };

    fn key(kind: RawEventKind) -> RawInputEvent {
        RawInputEvent::new(Instant::now(), kind)
    }

    #[test]
    fn test_command_mapping() {
        assert_eq!(KEYS.command_for(120), Some(ControlCommand::ToggleRun));
        assert_eq!(KEYS.command_for(121), Some(ControlCommand::Stop));
        assert_eq!(KEYS.command_for(122), Some(ControlCommand::ToggleRecord));
        assert_eq!(KEYS.command_for(65), None);
        assert!(KEYS.contains(121));
        assert!(!KEYS.contains(65));
    }

    #[test]
    fn test_auto_repeat_is_suppressed() {
        let mut dispatcher = HotkeyDispatcher::new(KEYS);

        assert_eq!(
            dispatcher.observe(&key(RawEventKind::KeyDown(120))),
            Some(ControlCommand::ToggleRun)
        );
        assert_eq!(dispatcher.observe(&key(RawEventKind::KeyDown(120))), None);
        assert_eq!(dispatcher.observe(&key(RawEventKind::KeyUp(120))), None);
        assert_eq!(
            dispatcher.observe(&key(RawEventKind::KeyDown(120))),
            Some(ControlCommand::ToggleRun)
        );
        assert_eq!(dispatcher.observe(&key(RawEventKind::KeyDown(65))), None);
    }

    #[tokio::test]
    async fn test_spawned_dispatcher_forwards_commands() {
        let (source, handle) = ChannelSource::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<ControlCommand>();

        let _task = HotkeyDispatcher::new(KEYS)
            .spawn(Box::new(source), tx)
            .unwrap();

        assert!(handle.emit(key(RawEventKind::KeyDown(65))));
        assert!(handle.emit(key(RawEventKind::KeyDown(122))));

        assert_eq!(rx.recv().await, Some(ControlCommand::ToggleRecord));
    }
}
