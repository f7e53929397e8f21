//! rdev-based input hook and synthesizer
//! Works on Windows, macOS, and Linux (X11)

use crate::data::{RawEventKind, RawInputEvent};
use crate::input::{keymap, InputActionSink, InputEventSource};
use anyhow::{anyhow, Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// How long to wait for `rdev::listen` to fail before assuming it attached
const LISTEN_PROBE: Duration = Duration::from_millis(250);

/// Process-wide hook. `rdev::listen` can only run once per process, so every
/// `RdevSource` subscribes to this single listener.
static HOOK: OnceLock<std::result::Result<Arc<Hook>, String>> = OnceLock::new();

static NEXT_SUBSCRIBER: AtomicU64 = AtomicU64::new(1);

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<RawInputEvent>,
}

struct Hook {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Hook {
    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Convert one rdev notification and fan it out. Runs on the hook thread,
    /// so it only converts and forwards.
    fn dispatch(&self, event: &rdev::Event, cursor: &mut (i32, i32)) {
        let timestamp = Instant::now();

        let kind = match event.event_type {
            rdev::EventType::KeyPress(key) => RawEventKind::KeyDown(keymap::key_to_code(key)),
            rdev::EventType::KeyRelease(key) => RawEventKind::KeyUp(keymap::key_to_code(key)),
            // rdev doesn't provide position with button events; use the last cursor position
            rdev::EventType::ButtonPress(button) => RawEventKind::ButtonDown {
                button: button.into(),
                x: cursor.0,
                y: cursor.1,
            },
            rdev::EventType::ButtonRelease(button) => RawEventKind::ButtonUp {
                button: button.into(),
                x: cursor.0,
                y: cursor.1,
            },
            rdev::EventType::MouseMove { x, y, .. } => {
                *cursor = (x.round() as i32, y.round() as i32);
                RawEventKind::MouseMove {
                    x: cursor.0,
                    y: cursor.1,
                }
            }
            rdev::EventType::Wheel { .. } => return,
        };

        let event = RawInputEvent::new(timestamp, kind);
        self.subscribers().retain(|s| s.tx.send(event).is_ok());
    }
}

fn hook() -> Result<Arc<Hook>> {
    HOOK.get_or_init(install_hook)
        .clone()
        .map_err(|reason| anyhow!(reason))
}

/// Spawn the listener thread. A failed install is remembered and not retried.
fn install_hook() -> std::result::Result<Arc<Hook>, String> {
    let hook = Arc::new(Hook {
        subscribers: Mutex::new(Vec::new()),
    });
    let (err_tx, err_rx) = std_mpsc::channel::<String>();

    let listener = hook.clone();
    thread::Builder::new()
        .name("rdev-listen".to_string())
        .spawn(move || {
            // Off the main thread, rdev must route keyboard layout (TSM) lookups
            // through the main queue or macOS aborts with dispatch_assert_queue_fail
            rdev::set_is_main_thread(false);

            info!("rdev input hook started");

            let mut cursor = (0, 0);
            let callback = move |event: rdev::Event| listener.dispatch(&event, &mut cursor);

            if let Err(e) = rdev::listen(callback) {
                error!("rdev listen error: {:?}", e);
                let _ = err_tx.send(format!("rdev listen failed: {:?}", e));
            }
        })
        .map_err(|e| format!("failed to spawn input hook thread: {e}"))?;

    match err_rx.recv_timeout(LISTEN_PROBE) {
        Ok(reason) => Err(reason),
        Err(RecvTimeoutError::Timeout) => Ok(hook),
        Err(RecvTimeoutError::Disconnected) => Err("input hook thread exited".to_string()),
    }
}

/// rdev-based input event source
#[derive(Default)]
pub struct RdevSource {
    subscription: Option<u64>,
}

impl RdevSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputEventSource for RdevSource {
    fn start(&mut self, tx: mpsc::UnboundedSender<RawInputEvent>) -> Result<()> {
        if self.subscription.is_some() {
            return Ok(()); // Already capturing
        }

        let hook = hook().context("Failed to attach rdev input hook")?;
        let id = NEXT_SUBSCRIBER.fetch_add(1, Ordering::SeqCst);
        hook.subscribers().push(Subscriber { id, tx });
        self.subscription = Some(id);

        debug!(subscriber = id, "rdev subscription added");
        Ok(())
    }

    fn stop(&mut self) {
        let Some(id) = self.subscription.take() else {
            return;
        };

        if let Ok(hook) = hook() {
            hook.subscribers().retain(|s| s.id != id);
        }
        debug!(subscriber = id, "rdev subscription removed");
    }

    fn is_capturing(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for RdevSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// rdev-based input synthesizer
#[derive(Debug, Default, Clone, Copy)]
pub struct RdevSink;

impl RdevSink {
    pub fn new() -> Self {
        Self
    }

    fn send(event_type: &rdev::EventType) -> Result<()> {
        rdev::simulate(event_type)
            .map_err(|e| anyhow!("rdev could not simulate {:?}: {:?}", event_type, e))
    }

    fn click(&self, x: i32, y: i32, button: rdev::Button) -> Result<()> {
        Self::send(&rdev::EventType::MouseMove {
            x: x as f64,
            y: y as f64,
        })?;
        Self::send(&rdev::EventType::ButtonPress(button))?;
        Self::send(&rdev::EventType::ButtonRelease(button))
    }
}

impl InputActionSink for RdevSink {
    fn key_down(&self, code: u32) -> Result<()> {
        Self::send(&rdev::EventType::KeyPress(keymap::code_to_key(code)))
    }

    fn key_up(&self, code: u32) -> Result<()> {
        Self::send(&rdev::EventType::KeyRelease(keymap::code_to_key(code)))
    }

    fn key_press(&self, code: u32) -> Result<()> {
        self.key_down(code)?;
        self.key_up(code)
    }

    fn click_left(&self, x: i32, y: i32) -> Result<()> {
        self.click(x, y, rdev::Button::Left)
    }

    fn click_right(&self, x: i32, y: i32) -> Result<()> {
        self.click(x, y, rdev::Button::Right)
    }
}
