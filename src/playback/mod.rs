//! Playback engine - replays scripts with looping, pause and stop

mod engine;

pub use engine::PlaybackEngine;

use std::fmt;
use std::time::Duration;

/// How many times a script is replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Replay the whole script exactly this many times
    Count(u32),
    /// Start new passes until this much time has elapsed since the run began.
    /// The deadline is only checked between passes; a started pass always finishes.
    Duration(Duration),
}

/// Phase of the playback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Paused,
    /// Stop requested, waiting for the run to notice
    Stopping,
}

/// Status updates from the playback engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// A run began
    Started,
    /// Execution suspended between actions
    Paused,
    /// Execution continues with the next action
    Resumed,
    /// Stop requested
    Stopping,
    /// Run cancelled before finishing
    Stopped,
    /// Every pass finished
    Completed {
        /// Number of full passes over the script
        passes: u32,
    },
    /// One action could not be injected; the run continues
    InjectionFailed {
        /// Position of the action in the script
        index: usize,
        error: String,
    },
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Started => f.write_str("started"),
            PlaybackStatus::Paused => f.write_str("paused"),
            PlaybackStatus::Resumed => f.write_str("resumed"),
            PlaybackStatus::Stopping => f.write_str("stopping"),
            PlaybackStatus::Stopped => f.write_str("stopped"),
            PlaybackStatus::Completed { .. } => f.write_str("completed"),
            PlaybackStatus::InjectionFailed { index, error } => {
                write!(f, "action {index} failed: {error}")
            }
        }
    }
}
