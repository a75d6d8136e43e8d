//! Mock key source for unit and integration testing.
//!
//! Allows tests to inject synthetic [`RawKeyEvent`]s without requiring
//! a running Windows message loop or OS hooks.

use std::sync::{
    mpsc::{self, Sender},
    Mutex, PoisonError,
};

use keypointer_core::VirtualKey;

use super::{CaptureError, KeySource, RawKeyEvent};

/// A mock implementation of [`KeySource`] that allows tests to inject events.
#[derive(Default)]
pub struct MockKeySource {
    sender: Mutex<Option<Sender<RawKeyEvent>>>,
}

impl MockKeySource {
    /// Creates a new mock key source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// Returns `false` if the source is not started or the receiver is gone.
    pub fn inject_event(&self, event: RawKeyEvent) -> bool {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .map(|sender| sender.send(event).is_ok())
            .unwrap_or(false)
    }

    /// Injects a press followed by a release of `key`.
    pub fn tap(&self, key: VirtualKey) -> bool {
        self.inject_event(RawKeyEvent::pressed(key)) && self.inject_event(RawKeyEvent::released(key))
    }

    /// `true` between `start()` and `stop()`.
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl KeySource for MockKeySource {
    fn start(&self) -> Result<mpsc::Receiver<RawKeyEvent>, CaptureError> {
        let mut guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        let (tx, rx) = mpsc::channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
