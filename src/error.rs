//! Error kinds surfaced by the capture and playback core

use thiserror::Error;

/// Errors reported by the recorder/player core
#[derive(Debug, Error)]
pub enum MacroError {
    /// Event capture could not attach to the input event source
    #[error("input event source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single action could not be dispatched to the input sink
    #[error("failed to inject {action}: {reason}")]
    InjectionFailed { action: String, reason: String },

    /// Playback was asked to start while a run is active
    #[error("playback is already running")]
    AlreadyRunning,

    /// A persisted script is structurally invalid
    #[error("malformed script: {0}")]
    MalformedScript(String),

    #[error("script i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MacroError>;
