//! Conversion of raw notifications into timed actions

use std::time::Instant;

use crate::control::ControlKeys;
use crate::data::{Action, MouseButton, RawEventKind, RawInputEvent};

/// Which notification kinds are recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFilter {
    pub keyboard: bool,
    pub mouse_buttons: bool,
}

impl Default for CaptureFilter {
    fn default() -> Self {
        Self {
            keyboard: true,
            mouse_buttons: true,
        }
    }
}

/// Stateful converter for one capture session
///
/// Before every recorded action it emits a `Delay` covering the time since
/// the previous recorded notification (or since the session started), so
/// playback reproduces the recorded pacing. Zero-length gaps emit nothing.
#[derive(Debug)]
pub struct ActionRecorder {
    control_keys: ControlKeys,
    filter: CaptureFilter,
    last_event: Instant,
}

impl ActionRecorder {
    pub fn new(control_keys: ControlKeys, filter: CaptureFilter, started_at: Instant) -> Self {
        Self {
            control_keys,
            filter,
            last_event: started_at,
        }
    }

    /// Convert one notification, passing the resulting actions to `emit` in
    /// order. Returns whether the notification was recorded.
    pub fn observe(&mut self, event: &RawInputEvent, mut emit: impl FnMut(Action)) -> bool {
        let Some(action) = self.action_for(event) else {
            return false;
        };

        // Out-of-order timestamps saturate to zero and never move the clock back
        let gap = event.timestamp.saturating_duration_since(self.last_event);
        let gap_ms = u64::try_from(gap.as_millis()).unwrap_or(u64::MAX);
        if gap_ms > 0 {
            emit(Action::delay(gap_ms));
        }
        self.last_event = self.last_event.max(event.timestamp);

        emit(action);
        true
    }

    fn action_for(&self, event: &RawInputEvent) -> Option<Action> {
        match event.kind {
            RawEventKind::KeyDown(code) | RawEventKind::KeyUp(code)
                if !self.filter.keyboard || self.control_keys.contains(code) =>
            {
                None
            }
            RawEventKind::KeyDown(key_code) => Some(Action::KeyDown { key_code }),
            RawEventKind::KeyUp(key_code) => Some(Action::KeyUp { key_code }),
            _ if !self.filter.mouse_buttons => None,
            RawEventKind::ButtonDown { button, x, y } => match button {
                MouseButton::Left => Some(Action::MouseLeftDown { x, y }),
                MouseButton::Right => Some(Action::MouseRightDown { x, y }),
                _ => None,
            },
            RawEventKind::ButtonUp { button, x, y } => match button {
                MouseButton::Left => Some(Action::MouseLeftUp { x, y }),
                MouseButton::Right => Some(Action::MouseRightUp { x, y }),
                _ => None,
            },
            RawEventKind::MouseMove { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const KEYS: ControlKeys = ControlKeys {
        toggle_run: 120,
        stop: 121,
        toggle_record: 122,
    };

    fn record(recorder: &mut ActionRecorder, events: &[RawInputEvent]) -> Vec<Action> {
        let mut actions = Vec::new();
        for event in events {
            recorder.observe(event, |a| actions.push(a));
        }
        actions
    }

    fn at(t0: Instant, ms: u64, kind: RawEventKind) -> RawInputEvent {
        RawInputEvent::new(t0 + Duration::from_millis(ms), kind)
    }

    #[test]
    fn test_delays_preserve_gaps() {
        let t0 = Instant::now();
        let mut recorder = ActionRecorder::new(KEYS, CaptureFilter::default(), t0);

        let actions = record(
            &mut recorder,
            &[
                at(t0, 250, RawEventKind::KeyDown(65)),
                at(t0, 330, RawEventKind::KeyUp(65)),
                at(t0, 330, RawEventKind::ButtonDown { button: MouseButton::Left, x: 4, y: 9 }),
                at(t0, 1330, RawEventKind::ButtonUp { button: MouseButton::Left, x: 4, y: 9 }),
            ],
        );

        assert_eq!(
            actions,
            vec![
                Action::delay(250),
                Action::KeyDown { key_code: 65 },
                Action::delay(80),
                Action::KeyUp { key_code: 65 },
                Action::MouseLeftDown { x: 4, y: 9 },
                Action::delay(1000),
                Action::MouseLeftUp { x: 4, y: 9 },
            ]
        );
    }

    #[test]
    fn test_no_delay_for_zero_or_backwards_gap() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut recorder = ActionRecorder::new(KEYS, CaptureFilter::default(), t0);

        let actions = record(
            &mut recorder,
            &[
                RawInputEvent::new(t0, RawEventKind::KeyDown(1)),
                RawInputEvent::new(t0 - Duration::from_millis(40), RawEventKind::KeyUp(1)),
                RawInputEvent::new(t0 + Duration::from_micros(300), RawEventKind::KeyDown(2)),
            ],
        );

        assert_eq!(
            actions,
            vec![
                Action::KeyDown { key_code: 1 },
                Action::KeyUp { key_code: 1 },
                Action::KeyDown { key_code: 2 },
            ]
        );
    }

    #[test]
    fn test_control_keys_are_never_recorded() {
        let t0 = Instant::now();
        let mut recorder = ActionRecorder::new(KEYS, CaptureFilter::default(), t0);

        let actions = record(
            &mut recorder,
            &[
                at(t0, 10, RawEventKind::KeyDown(120)),
                at(t0, 20, RawEventKind::KeyUp(120)),
                at(t0, 30, RawEventKind::KeyDown(121)),
                at(t0, 40, RawEventKind::KeyDown(122)),
                at(t0, 50, RawEventKind::KeyDown(65)),
            ],
        );

        // Skipped notifications don't reset the clock
        assert_eq!(actions, vec![Action::delay(50), Action::KeyDown { key_code: 65 }]);
    }

    #[test]
    fn test_movement_and_other_buttons_ignored() {
        let t0 = Instant::now();
        let mut recorder = ActionRecorder::new(KEYS, CaptureFilter::default(), t0);

        let actions = record(
            &mut recorder,
            &[
                at(t0, 5, RawEventKind::MouseMove { x: 1, y: 1 }),
                at(t0, 6, RawEventKind::ButtonDown { button: MouseButton::Middle, x: 1, y: 1 }),
                at(t0, 7, RawEventKind::ButtonDown { button: MouseButton::Right, x: 1, y: 1 }),
                at(t0, 9, RawEventKind::ButtonUp { button: MouseButton::Right, x: 2, y: 3 }),
            ],
        );

        assert_eq!(
            actions,
            vec![
                Action::delay(7),
                Action::MouseRightDown { x: 1, y: 1 },
                Action::delay(2),
                Action::MouseRightUp { x: 2, y: 3 },
            ]
        );
    }

    #[test]
    fn test_filter_drops_disabled_kinds() {
        let t0 = Instant::now();
        let filter = CaptureFilter {
            keyboard: false,
            mouse_buttons: true,
        };
        let mut recorder = ActionRecorder::new(KEYS, filter, t0);

        let actions = record(
            &mut recorder,
            &[
                at(t0, 10, RawEventKind::KeyDown(65)),
                at(t0, 15, RawEventKind::ButtonDown { button: MouseButton::Left, x: 0, y: 0 }),
            ],
        );

        assert_eq!(
            actions,
            vec![Action::delay(15), Action::MouseLeftDown { x: 0, y: 0 }]
        );
    }
}
