//! Test doubles for the input ports

use crate::data::RawInputEvent;
use crate::input::{InputActionSink, InputEventSource};
use anyhow::{bail, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A single call observed by `RecordingSink`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    KeyDown(u32),
    KeyUp(u32),
    KeyPress(u32),
    ClickLeft(i32, i32),
    ClickRight(i32, i32),
}

/// Sink that records every call, optionally failing for one key code
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    fail_on: Option<u32>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(code: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(code),
        })
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: SinkCall, code: Option<u32>) -> Result<()> {
        if code.is_some() && code == self.fail_on {
            bail!("injection refused for {:?}", call);
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl InputActionSink for RecordingSink {
    fn key_down(&self, code: u32) -> Result<()> {
        self.record(SinkCall::KeyDown(code), Some(code))
    }

    fn key_up(&self, code: u32) -> Result<()> {
        self.record(SinkCall::KeyUp(code), Some(code))
    }

    fn key_press(&self, code: u32) -> Result<()> {
        self.record(SinkCall::KeyPress(code), Some(code))
    }

    fn click_left(&self, x: i32, y: i32) -> Result<()> {
        self.record(SinkCall::ClickLeft(x, y), None)
    }

    fn click_right(&self, x: i32, y: i32) -> Result<()> {
        self.record(SinkCall::ClickRight(x, y), None)
    }
}

type SharedSender = Arc<Mutex<Option<mpsc::UnboundedSender<RawInputEvent>>>>;

/// Source whose notifications are pushed by the test through a `SourceHandle`
pub struct ChannelSource {
    tx: SharedSender,
    refuse: bool,
}

#[derive(Clone)]
pub struct SourceHandle {
    tx: SharedSender,
}

impl ChannelSource {
    pub fn new() -> (Self, SourceHandle) {
        let tx: SharedSender = Arc::new(Mutex::new(None));
        (
            Self {
                tx: tx.clone(),
                refuse: false,
            },
            SourceHandle { tx },
        )
    }

    /// A source whose hook registration is always refused
    pub fn refusing() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
            refuse: true,
        }
    }
}

impl InputEventSource for ChannelSource {
    fn start(&mut self, tx: mpsc::UnboundedSender<RawInputEvent>) -> Result<()> {
        if self.refuse {
            bail!("hook registration refused");
        }
        *self.tx.lock().unwrap() = Some(tx);
        Ok(())
    }

    fn stop(&mut self) {
        self.tx.lock().unwrap().take();
    }

    fn is_capturing(&self) -> bool {
        self.tx.lock().unwrap().is_some()
    }
}

impl SourceHandle {
    /// Deliver a notification. Returns false when the source is detached.
    pub fn emit(&self, event: RawInputEvent) -> bool {
        match self.tx.lock().unwrap().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}
