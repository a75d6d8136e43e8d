//! Bridge from the label-toggle actions to the overlay layer.
//!
//! The overlay that draws hint labels lives outside this daemon.  It only needs
//! to know when `ShowUiLabels` / `ShowGridLabels` flip, so the bridge observes
//! those two latches and forwards each transition as a serializable
//! [`LabelToggle`] over a bounded `tokio::sync::mpsc` channel.
//!
//! Observers run on the dispatch thread and must not block it, so sends use
//! `try_send`: if the consumer falls behind and the channel is full the
//! notification is dropped and logged at `debug`.

use std::sync::Arc;

use keypointer_core::{Action, ActionObserver, HeldActionState};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Default channel depth used by the daemon.
pub const DEFAULT_CAPACITY: usize = 32;

/// One visibility change for a label overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelToggle {
    pub action: Action,
    pub visible: bool,
}

/// Forwards label-toggle transitions to a channel.
pub struct LabelToggleBridge {
    tx: mpsc::Sender<LabelToggle>,
}

impl LabelToggleBridge {
    /// Creates a bridge with a `capacity`-deep channel and subscribes it to
    /// [`Action::LABEL_TOGGLES`].
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (a `tokio::sync::mpsc` requirement).
    pub fn attach(
        state: &HeldActionState,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<LabelToggle>) {
        let (tx, rx) = mpsc::channel(capacity);
        let bridge = Arc::new(Self { tx });
        state.subscribe_all(
            &Action::LABEL_TOGGLES,
            Arc::clone(&bridge) as Arc<dyn ActionObserver>,
        );
        (bridge, rx)
    }

    /// Forwards one toggle; returns `false` if it was dropped.
    pub fn forward(&self, toggle: LabelToggle) -> bool {
        match self.tx.try_send(toggle) {
            Ok(()) => true,
            Err(TrySendError::Full(t)) => {
                debug!(action = %t.action, visible = t.visible, "label channel full, dropping");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("label consumer gone");
                false
            }
        }
    }
}

impl ActionObserver for LabelToggleBridge {
    fn on_action_changed(&self, action: Action, held: bool) {
        if Action::LABEL_TOGGLES.contains(&action) {
            self.forward(LabelToggle {
                action,
                visible: held,
            });
        }
    }
}
