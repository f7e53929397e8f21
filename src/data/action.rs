//! Recordable and replayable steps

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single step of a macro
///
/// Each variant carries only the fields meaningful to its kind. When a
/// persisted action omits one of those fields it defaults to zero; fields that
/// belong to other kinds are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Action {
    KeyDown {
        #[serde(default)]
        key_code: u32,
    },
    KeyUp {
        #[serde(default)]
        key_code: u32,
    },
    /// Atomic down+up of a key
    KeyPress {
        #[serde(default)]
        key_code: u32,
    },
    MouseLeftDown {
        #[serde(default)]
        x: i32,
        #[serde(default)]
        y: i32,
    },
    MouseLeftUp {
        #[serde(default)]
        x: i32,
        #[serde(default)]
        y: i32,
    },
    MouseRightDown {
        #[serde(default)]
        x: i32,
        #[serde(default)]
        y: i32,
    },
    MouseRightUp {
        #[serde(default)]
        x: i32,
        #[serde(default)]
        y: i32,
    },
    MouseClick {
        #[serde(default)]
        x: i32,
        #[serde(default)]
        y: i32,
    },
    /// Left click, then hold the run for `duration_ms`
    MouseLongPress {
        #[serde(default)]
        x: i32,
        #[serde(default)]
        y: i32,
        #[serde(default)]
        duration_ms: u64,
    },
    #[serde(alias = "DelayMs")]
    Delay {
        #[serde(default)]
        duration_ms: u64,
    },
}

impl Action {
    pub fn delay(duration_ms: u64) -> Self {
        Action::Delay { duration_ms }
    }

    /// Kind name, as written in the persisted `type` field
    pub fn name(&self) -> &'static str {
        match self {
            Action::KeyDown { .. } => "KeyDown",
            Action::KeyUp { .. } => "KeyUp",
            Action::KeyPress { .. } => "KeyPress",
            Action::MouseLeftDown { .. } => "MouseLeftDown",
            Action::MouseLeftUp { .. } => "MouseLeftUp",
            Action::MouseRightDown { .. } => "MouseRightDown",
            Action::MouseRightUp { .. } => "MouseRightUp",
            Action::MouseClick { .. } => "MouseClick",
            Action::MouseLongPress { .. } => "MouseLongPress",
            Action::Delay { .. } => "Delay",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match *self {
            Action::KeyDown { key_code }
            | Action::KeyUp { key_code }
            | Action::KeyPress { key_code } => write!(f, "{name} VK:{key_code}"),
            Action::MouseLeftDown { x, y }
            | Action::MouseLeftUp { x, y }
            | Action::MouseRightDown { x, y }
            | Action::MouseRightUp { x, y }
            | Action::MouseClick { x, y } => write!(f, "{name} ({x}, {y})"),
            Action::MouseLongPress { x, y, duration_ms } => {
                write!(f, "{name} ({x}, {y}) {duration_ms}ms")
            }
            Action::Delay { duration_ms } => write!(f, "{name} {duration_ms}ms"),
        }
    }
}
