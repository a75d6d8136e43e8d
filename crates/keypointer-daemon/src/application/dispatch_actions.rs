//! ActionDispatcher: the single integration point between raw key events and
//! the logical action model.
//!
//! Each raw event is looked up in the [`KeyMapping`]; unmapped keys are
//! ignored (the hook has already passed them on to the OS), mapped keys set
//! the corresponding latch in [`HeldActionState`], which in turn notifies the
//! drivers.
//!
//! The dispatcher holds no mutable state of its own, so back-to-back events
//! from any thread are safe.

use std::io;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use keypointer_core::{Action, HeldActionState, KeyEventKind, KeyMapping, VirtualKey};
use tracing::{debug, info, trace};

use crate::infrastructure::input_capture::RawKeyEvent;

/// Maps raw key events to held-state changes.
pub struct ActionDispatcher {
    mapping: KeyMapping,
    state: Arc<HeldActionState>,
}

impl ActionDispatcher {
    /// Creates a dispatcher writing into `state`.
    pub fn new(mapping: KeyMapping, state: Arc<HeldActionState>) -> Self {
        Self { mapping, state }
    }

    /// The state table this dispatcher writes.
    pub fn state(&self) -> &Arc<HeldActionState> {
        &self.state
    }

    /// Handles one raw key event.
    ///
    /// Returns the action the key is bound to, or `None` for an unmapped key.
    pub fn on_raw_key_event(&self, key: VirtualKey, kind: KeyEventKind) -> Option<Action> {
        let Some(action) = self.mapping.action_for(key) else {
            trace!(%key, "unmapped key");
            return None;
        };

        let held = kind.is_pressed();
        if self.state.set(action, held) {
            debug!(%key, %action, held, "action changed");
        }
        Some(action)
    }

    /// Drains `events` until the sending side disconnects.
    ///
    /// Returns the number of events processed.
    pub fn pump(&self, events: Receiver<RawKeyEvent>) -> u64 {
        let mut processed = 0u64;
        for event in events {
            if let Some(action) = self.on_raw_key_event(event.vk_code, event.kind) {
                trace!(%action, time_ms = event.time_ms, "hook event dispatched");
            }
            processed += 1;
        }
        debug!(processed, "key event channel closed");
        processed
    }

    /// Runs [`ActionDispatcher::pump`] on a dedicated `keypointer-dispatch` thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn_pump(
        self: Arc<Self>,
        events: Receiver<RawKeyEvent>,
    ) -> io::Result<JoinHandle<u64>> {
        thread::Builder::new()
            .name("keypointer-dispatch".to_string())
            .spawn(move || self.pump(events))
    }

    /// Releases every held action, notifying observers of each release.
    ///
    /// Used on shutdown so that no button stays pressed and the motion loop
    /// stops; while running, a silent hook leaves the latches untouched.
    pub fn release_all(&self) {
        let released = Action::ALL
            .iter()
            .filter(|&&action| self.state.set(action, false))
            .count();
        if released > 0 {
            info!(released, "released held actions");
        }
    }
}
