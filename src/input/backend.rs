//! Input ports: where raw notifications come from and where actions go

use crate::data::RawInputEvent;
use anyhow::Result;
use tokio::sync::mpsc;

/// Trait for raw input sources
///
/// Implementations only observe input. Every notification keeps flowing to
/// the rest of the system whether or not anyone consumes it here.
pub trait InputEventSource: Send {
    /// Start delivering notifications to the provided channel
    fn start(&mut self, tx: mpsc::UnboundedSender<RawInputEvent>) -> Result<()>;

    /// Detach from the platform hook. Safe to call when not started.
    fn stop(&mut self);

    /// Whether notifications are currently being delivered
    fn is_capturing(&self) -> bool;
}

/// Trait for synthetic input injection
pub trait InputActionSink: Send + Sync {
    fn key_down(&self, code: u32) -> Result<()>;

    fn key_up(&self, code: u32) -> Result<()>;

    /// Atomic down+up
    fn key_press(&self, code: u32) -> Result<()>;

    fn click_left(&self, x: i32, y: i32) -> Result<()>;

    fn click_right(&self, x: i32, y: i32) -> Result<()>;
}
