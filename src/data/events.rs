//! Raw input notifications delivered by an input event source

use std::time::Instant;

/// A single raw notification from the platform input hook
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInputEvent {
    /// When the notification was observed
    pub timestamp: Instant,

    /// What happened
    pub kind: RawEventKind,
}

/// Type of raw notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    /// Key transitioned down (virtual-key code)
    KeyDown(u32),

    /// Key transitioned up (virtual-key code)
    KeyUp(u32),

    /// Mouse button pressed at screen coordinates
    ButtonDown { button: MouseButton, x: i32, y: i32 },

    /// Mouse button released at screen coordinates
    ButtonUp { button: MouseButton, x: i32, y: i32 },

    /// Cursor moved
    MouseMove { x: i32, y: i32 },
}

impl RawInputEvent {
    pub fn new(timestamp: Instant, kind: RawEventKind) -> Self {
        Self { timestamp, kind }
    }
}

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u8),
}

impl From<rdev::Button> for MouseButton {
    fn from(button: rdev::Button) -> Self {
        match button {
            rdev::Button::Left => MouseButton::Left,
            rdev::Button::Right => MouseButton::Right,
            rdev::Button::Middle => MouseButton::Middle,
            rdev::Button::Unknown(n) => MouseButton::Other(n),
        }
    }
}
