//! Input ports and their platform adapters

mod backend;
pub mod keymap;
pub(crate) mod rdev_backend;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::*;
pub use rdev_backend::{RdevSink, RdevSource};
