//! ButtonEmulationDriver: translates button-action transitions into
//! synthesized mouse input.
//!
//! | Action        | On press                     | On release  |
//! |---------------|------------------------------|-------------|
//! | LeftButton    | left down                    | left up     |
//! | RightButton   | right down                   | right up    |
//! | MiddleButton  | middle down                  | middle up   |
//! | DoubleClick   | left down, up, down, up      | nothing     |
//! | ScrollUp      | one wheel notch away (+120)  | nothing     |
//! | ScrollDown    | one wheel notch toward (-120)| nothing     |
//!
//! The cursor position is sampled at the moment of each transition.  The
//! driver is stateless: the latches only notify on real flips, so one
//! transition produces exactly one emission and nothing is debounced here.

use std::sync::Arc;

use keypointer_core::{Action, ActionObserver, HeldActionState};
use tracing::{debug, warn};

use super::pointer_backend::WHEEL_DELTA;
use super::{MouseButton, PointerBackend, PointerError};

/// Emits mouse button and wheel input for the button actions.
pub struct ButtonEmulationDriver {
    backend: Arc<dyn PointerBackend>,
}

impl ButtonEmulationDriver {
    pub fn new(backend: Arc<dyn PointerBackend>) -> Self {
        Self { backend }
    }

    /// Creates a driver and subscribes it to [`Action::BUTTONS`].
    pub fn attach(state: &HeldActionState, backend: Arc<dyn PointerBackend>) -> Arc<Self> {
        let driver = Arc::new(Self::new(backend));
        state.subscribe_all(
            &Action::BUTTONS,
            Arc::clone(&driver) as Arc<dyn ActionObserver>,
        );
        driver
    }

    /// Handles one transition of a button action.
    ///
    /// # Errors
    ///
    /// Returns the first [`PointerError`] from the backend; later emissions of
    /// a double click are skipped once one fails.
    pub fn handle_transition(&self, action: Action, held: bool) -> Result<(), PointerError> {
        match (action, held) {
            (Action::LeftButton, _) => self.press(MouseButton::Left, held),
            (Action::RightButton, _) => self.press(MouseButton::Right, held),
            (Action::MiddleButton, _) => self.press(MouseButton::Middle, held),
            (Action::DoubleClick, true) => self.double_click(),
            (Action::ScrollUp, true) => self.scroll(WHEEL_DELTA),
            (Action::ScrollDown, true) => self.scroll(-WHEEL_DELTA),
            _ => Ok(()),
        }
    }

    fn press(&self, button: MouseButton, pressed: bool) -> Result<(), PointerError> {
        let (x, y) = self.sample_position();
        self.backend.emit_button(button, pressed, x, y)
    }

    fn double_click(&self) -> Result<(), PointerError> {
        let (x, y) = self.sample_position();
        for pressed in [true, false, true, false] {
            self.backend.emit_button(MouseButton::Left, pressed, x, y)?;
        }
        Ok(())
    }

    fn scroll(&self, delta: i16) -> Result<(), PointerError> {
        let (x, y) = self.sample_position();
        self.backend.emit_wheel(delta, x, y)
    }

    /// Reads the cursor for the event position.
    ///
    /// Button events are applied by the OS at the live cursor, so a failed read
    /// must not drop the event (a lost release would leave the button stuck);
    /// the origin is reported instead.
    fn sample_position(&self) -> (i32, i32) {
        self.backend.cursor_position().unwrap_or_else(|e| {
            debug!("cursor read failed, emitting at origin: {e}");
            (0, 0)
        })
    }
}

impl ActionObserver for ButtonEmulationDriver {
    fn on_action_changed(&self, action: Action, held: bool) {
        if let Err(e) = self.handle_transition(action, held) {
            warn!(%action, held, "button emulation failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pointer_backend::MockPointerBackend;
    use crate::infrastructure::pointer_output::mock::{
        ButtonRecord, RecordingPointerBackend, WheelRecord,
    };
    use mockall::predicate::eq;

    fn make_driver() -> (HeldActionState, Arc<RecordingPointerBackend>) {
        let state = HeldActionState::new();
        let backend = Arc::new(RecordingPointerBackend::at(320, 240));
        ButtonEmulationDriver::attach(&state, Arc::clone(&backend) as Arc<dyn PointerBackend>);
        (state, backend)
    }

    #[test]
    fn test_left_press_emits_exactly_one_button_down() {
        // Arrange
        let (state, backend) = make_driver();

        // Act
        state.set(Action::LeftButton, true);

        // Assert
        assert_eq!(
            backend.buttons(),
            vec![ButtonRecord {
                button: MouseButton::Left,
                pressed: true,
                x: 320,
                y: 240
            }]
        );
    }

    #[test]
    fn test_left_release_emits_exactly_one_button_up() {
        let (state, backend) = make_driver();

        state.set(Action::LeftButton, true);
        state.set(Action::LeftButton, false);

        let buttons = backend.buttons();
        assert_eq!(buttons.len(), 2);
        assert!(!buttons[1].pressed);
        assert_eq!(buttons[1].button, MouseButton::Left);
    }

    #[test]
    fn test_repeated_identical_sets_emit_nothing_more() {
        let (state, backend) = make_driver();

        state.set(Action::RightButton, true);
        state.set(Action::RightButton, true);
        state.set(Action::RightButton, true);
        state.set(Action::RightButton, false);
        state.set(Action::RightButton, false);

        let pressed: Vec<bool> = backend.buttons().iter().map(|b| b.pressed).collect();
        assert_eq!(pressed, vec![true, false]);
    }

    #[test]
    fn test_position_is_sampled_at_each_transition() {
        let (state, backend) = make_driver();

        state.set(Action::MiddleButton, true);
        backend.move_to(10, 20);
        state.set(Action::MiddleButton, false);

        let buttons = backend.buttons();
        assert_eq!((buttons[0].x, buttons[0].y), (320, 240));
        assert_eq!((buttons[1].x, buttons[1].y), (10, 20));
    }

    #[test]
    fn test_double_click_emits_two_left_clicks_on_press_only() {
        let (state, backend) = make_driver();

        state.set(Action::DoubleClick, true);
        state.set(Action::DoubleClick, false);

        let seq: Vec<(MouseButton, bool)> =
            backend.buttons().iter().map(|b| (b.button, b.pressed)).collect();
        assert_eq!(
            seq,
            vec![
                (MouseButton::Left, true),
                (MouseButton::Left, false),
                (MouseButton::Left, true),
                (MouseButton::Left, false),
            ]
        );
    }

    #[test]
    fn test_scroll_actions_emit_one_notch_per_press() {
        let (state, backend) = make_driver();

        state.set(Action::ScrollUp, true);
        state.set(Action::ScrollUp, false);
        state.set(Action::ScrollDown, true);
        state.set(Action::ScrollDown, false);

        assert_eq!(
            backend.wheels(),
            vec![
                WheelRecord { delta: 120, x: 320, y: 240 },
                WheelRecord { delta: -120, x: 320, y: 240 },
            ]
        );
        assert!(backend.buttons().is_empty());
    }

    #[test]
    fn test_non_button_actions_are_ignored() {
        let backend = Arc::new(RecordingPointerBackend::at(0, 0));
        let driver = ButtonEmulationDriver::new(Arc::clone(&backend) as Arc<dyn PointerBackend>);

        driver.handle_transition(Action::MoveUp, true).unwrap();
        driver.handle_transition(Action::ShowUiLabels, true).unwrap();

        assert!(backend.buttons().is_empty());
        assert!(backend.wheels().is_empty());
    }

    #[test]
    fn test_failed_cursor_read_still_emits_release() {
        // Arrange
        let mut backend = MockPointerBackend::new();
        backend
            .expect_cursor_position()
            .returning(|| Err(PointerError::Platform("no desktop".into())));
        backend
            .expect_emit_button()
            .with(eq(MouseButton::Left), eq(false), eq(0), eq(0))
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        let driver = ButtonEmulationDriver::new(Arc::new(backend));

        // Act
        let result = driver.handle_transition(Action::LeftButton, false);

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_emit_failure_is_reported() {
        let mut backend = MockPointerBackend::new();
        backend.expect_cursor_position().returning(|| Ok((1, 1)));
        backend
            .expect_emit_button()
            .times(1)
            .returning(|_, _, _, _| Err(PointerError::Platform("SendInput".into())));
        let driver = ButtonEmulationDriver::new(Arc::new(backend));

        // A double click stops at the first failed emission.
        let result = driver.handle_transition(Action::DoubleClick, true);

        assert_eq!(result, Err(PointerError::Platform("SendInput".into())));
    }
}
