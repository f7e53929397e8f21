//! Action model, scripts, and raw input notifications

mod action;
mod events;
mod script;

pub use action::*;
pub use events::*;
pub use script::*;
