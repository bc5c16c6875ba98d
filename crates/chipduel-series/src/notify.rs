//! Test/harness notifier implementations.
//!
//! The [`Notifier`] seam itself lives in `chipduel-types` so every plane can
//! emit events; this module adds a buffering implementation for tests and
//! local harnesses.

use std::sync::Mutex;

use chipduel_types::{NotificationEvent, Notifier};

/// Buffers every event. Backs tests and local harnesses.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything notified so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &NotificationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
