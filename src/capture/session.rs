//! Capture sessions: source subscription plus conversion worker

use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{ActionRecorder, CaptureFilter};
use crate::control::ControlKeys;
use crate::data::{Action, RawInputEvent};
use crate::error::{MacroError, Result};
use crate::input::InputEventSource;

/// Records live input as actions while a session is active
///
/// Raw notifications are queued by the source's delivery context and
/// converted on a worker task, so the hook callback only enqueues.
/// Recorded actions are published on the listener channel one at a time.
pub struct EventCapture {
    source: Box<dyn InputEventSource>,
    control_keys: ControlKeys,
    filter: CaptureFilter,
    listener: mpsc::UnboundedSender<Action>,
    worker: Option<JoinHandle<usize>>,
}

impl EventCapture {
    pub fn new(
        source: Box<dyn InputEventSource>,
        control_keys: ControlKeys,
        filter: CaptureFilter,
        listener: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            source,
            control_keys,
            filter,
            listener,
            worker: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.worker.is_some()
    }

    /// Begin a capture session. The inter-event clock starts now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.is_recording() {
            warn!("Capture start requested while already recording");
            return Ok(());
        }

        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<RawInputEvent>();
        if let Err(e) = self.source.start(raw_tx) {
            error!("Failed to attach input source: {:#}", e);
            return Err(MacroError::SourceUnavailable(format!("{:#}", e)));
        }

        let session_id = Uuid::new_v4();
        let recorder = ActionRecorder::new(self.control_keys, self.filter, Instant::now());
        let listener = self.listener.clone();
        let span = info_span!("capture", session = %session_id);

        self.worker = Some(tokio::spawn(
            convert(recorder, raw_rx, listener).instrument(span),
        ));
        info!(session = %session_id, "Recording started");
        Ok(())
    }

    /// Detach from the source and wait until every queued notification has
    /// been converted. Returns the number of notifications recorded.
    pub async fn stop(&mut self) -> usize {
        self.source.stop();

        let Some(worker) = self.worker.take() else {
            return 0;
        };

        match worker.await {
            Ok(recorded) => {
                info!(recorded, "Recording stopped");
                recorded
            }
            Err(e) => {
                error!("Capture worker failed: {}", e);
                0
            }
        }
    }
}

async fn convert(
    mut recorder: ActionRecorder,
    mut raw_rx: mpsc::UnboundedReceiver<RawInputEvent>,
    listener: mpsc::UnboundedSender<Action>,
) -> usize {
    let mut recorded = 0;

    while let Some(event) = raw_rx.recv().await {
        let accepted = recorder.observe(&event, |action| {
            debug!(%action, "Captured");
            if listener.send(action).is_err() {
                debug!("Action listener dropped");
            }
        });

        if accepted {
            recorded += 1;
        }
    }

    recorded
}
