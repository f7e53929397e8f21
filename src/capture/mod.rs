//! Event capture: live input to timed actions

mod recorder;
mod session;

pub use recorder::{ActionRecorder, CaptureFilter};
pub use session::EventCapture;
