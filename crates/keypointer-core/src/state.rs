//! Held-action latches.
//!
//! [`HeldActionState`] holds one boolean latch per [`Action`].  It is written by
//! the dispatcher (on the thread that drains the keyboard hook) and read by the
//! motion loop thread, so every latch is an `AtomicBool`: [`HeldActionState::get`]
//! never takes a lock.
//!
//! Each latch also owns its own observer list behind its own `Mutex`.
//! [`HeldActionState::set`] holds that mutex across the swap and the
//! notification, which serialises concurrent writers of the *same* action and
//! delivers its notifications in the order the writes happened.  Writers of
//! different actions never contend.
//!
//! Observers are notified only when the value actually flips; setting a latch
//! to the value it already holds is silent.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{error, trace};

use crate::action::Action;

/// Receives held-state transitions for the actions it subscribed to.
///
/// Called synchronously on the writer's thread while the latch's observer lock
/// is held.  Implementations must not call [`HeldActionState::set`] or
/// [`HeldActionState::subscribe`] for the action being delivered.
///
/// A panic inside an observer is caught and logged; the remaining observers
/// are still notified and the writer carries on.
pub trait ActionObserver: Send + Sync {
    /// `held` is the new value of the latch for `action`.
    fn on_action_changed(&self, action: Action, held: bool);
}

#[derive(Default)]
struct Latch {
    held: AtomicBool,
    observers: Mutex<Vec<Arc<dyn ActionObserver>>>,
}

impl Latch {
    fn observers(&self) -> MutexGuard<'_, Vec<Arc<dyn ActionObserver>>> {
        // A panicking observer must not wedge the key path.
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One observable latch per action; the source of truth for "is this held".
pub struct HeldActionState {
    latches: [Latch; Action::COUNT],
}

impl HeldActionState {
    /// Creates a state table with every action released.
    pub fn new() -> Self {
        Self {
            latches: std::array::from_fn(|_| Latch::default()),
        }
    }

    /// Returns whether `action` is currently held.
    #[inline]
    pub fn get(&self, action: Action) -> bool {
        self.latches[action.index()].held.load(Ordering::Acquire)
    }

    /// Returns `true` if any of `actions` is currently held.
    pub fn any_held(&self, actions: &[Action]) -> bool {
        actions.iter().any(|&a| self.get(a))
    }

    /// Sets the latch for `action` and notifies its observers if it flipped.
    ///
    /// Returns `true` if the value changed.
    pub fn set(&self, action: Action, held: bool) -> bool {
        let latch = &self.latches[action.index()];
        let observers = latch.observers();

        if latch.held.swap(held, Ordering::AcqRel) == held {
            return false;
        }

        trace!(%action, held, observers = observers.len(), "latch flipped");
        for observer in observers.iter() {
            // Every observer hears the flip even if an earlier one panicked;
            // otherwise a release could be lost and a button left pressed.
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
                observer.on_action_changed(action, held)
            }));
            if delivered.is_err() {
                error!(%action, held, "action observer panicked");
            }
        }
        true
    }

    /// Registers `observer` for transitions of `action`.
    pub fn subscribe(&self, action: Action, observer: Arc<dyn ActionObserver>) {
        self.latches[action.index()].observers().push(observer);
    }

    /// Registers `observer` for transitions of every action in `actions`.
    pub fn subscribe_all(&self, actions: &[Action], observer: Arc<dyn ActionObserver>) {
        for &action in actions {
            self.subscribe(action, Arc::clone(&observer));
        }
    }

    /// Returns the number of observers registered for `action`.
    pub fn observer_count(&self, action: Action) -> usize {
        self.latches[action.index()].observers().len()
    }
}

impl Default for HeldActionState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeldActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held: Vec<Action> = Action::ALL.iter().copied().filter(|&a| self.get(a)).collect();
        f.debug_struct("HeldActionState").field("held", &held).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<(Action, bool)>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<(Action, bool)> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ActionObserver for RecordingObserver {
        fn on_action_changed(&self, action: Action, held: bool) {
            self.events.lock().unwrap().push((action, held));
        }
    }

    fn state_with_observer(actions: &[Action]) -> (HeldActionState, Arc<RecordingObserver>) {
        let state = HeldActionState::new();
        let observer = Arc::new(RecordingObserver::default());
        state.subscribe_all(actions, Arc::clone(&observer) as Arc<dyn ActionObserver>);
        (state, observer)
    }

    #[test]
    fn test_new_state_has_every_action_released() {
        let state = HeldActionState::new();
        for action in Action::ALL {
            assert!(!state.get(action));
        }
    }

    #[test]
    fn test_set_fires_once_for_repeated_identical_value() {
        for action in Action::ALL {
            // Arrange
            let (state, observer) = state_with_observer(&[action]);

            // Act
            let first = state.set(action, true);
            let second = state.set(action, true);

            // Assert
            assert!(first);
            assert!(!second);
            assert_eq!(observer.events(), vec![(action, true)]);
        }
    }

    #[test]
    fn test_setting_released_action_to_released_is_silent() {
        let (state, observer) = state_with_observer(&[Action::LeftButton]);

        assert!(!state.set(Action::LeftButton, false));

        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_press_release_press_fires_three_transitions_in_order() {
        let (state, observer) = state_with_observer(&[Action::MoveUp]);

        state.set(Action::MoveUp, true);
        state.set(Action::MoveUp, false);
        state.set(Action::MoveUp, true);

        assert_eq!(
            observer.events(),
            vec![
                (Action::MoveUp, true),
                (Action::MoveUp, false),
                (Action::MoveUp, true)
            ]
        );
    }

    #[test]
    fn test_observer_only_sees_subscribed_actions() {
        let (state, observer) = state_with_observer(&[Action::MoveLeft]);

        state.set(Action::MoveRight, true);
        state.set(Action::MoveLeft, true);

        assert_eq!(observer.events(), vec![(Action::MoveLeft, true)]);
        assert!(state.get(Action::MoveRight));
    }

    #[test]
    fn test_observer_sees_new_value_through_get() {
        struct ReadBack {
            state: Arc<HeldActionState>,
            seen: Mutex<Vec<bool>>,
        }
        impl ActionObserver for ReadBack {
            fn on_action_changed(&self, action: Action, _held: bool) {
                self.seen.lock().unwrap().push(self.state.get(action));
            }
        }

        let state = Arc::new(HeldActionState::new());
        let observer = Arc::new(ReadBack {
            state: Arc::clone(&state),
            seen: Mutex::new(Vec::new()),
        });
        state.subscribe(Action::SpeedUp, Arc::clone(&observer) as Arc<dyn ActionObserver>);

        state.set(Action::SpeedUp, true);
        state.set(Action::SpeedUp, false);

        assert_eq!(*observer.seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_any_held() {
        let state = HeldActionState::new();
        assert!(!state.any_held(&Action::DIRECTIONS));

        state.set(Action::MoveDown, true);

        assert!(state.any_held(&Action::DIRECTIONS));
        assert!(!state.any_held(&Action::LABEL_TOGGLES));
    }

    #[test]
    fn test_subscribe_all_registers_on_each_action() {
        let (state, _observer) = state_with_observer(&Action::DIRECTIONS);
        for action in Action::DIRECTIONS {
            assert_eq!(state.observer_count(action), 1);
        }
        assert_eq!(state.observer_count(Action::LeftButton), 0);
    }

    #[test]
    fn test_concurrent_writers_of_different_actions_each_see_their_own_transitions() {
        // Arrange
        let (state, observer) = state_with_observer(&[Action::MoveUp, Action::MoveDown]);
        let state = Arc::new(state);

        // Act: two threads toggle different actions 500 times each.
        let handles: Vec<_> = [Action::MoveUp, Action::MoveDown]
            .into_iter()
            .map(|action| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for i in 0..500 {
                        state.set(action, i % 2 == 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Assert: per action, notifications strictly alternate starting with `true`.
        for action in [Action::MoveUp, Action::MoveDown] {
            let values: Vec<bool> = observer
                .events()
                .into_iter()
                .filter(|&(a, _)| a == action)
                .map(|(_, v)| v)
                .collect();
            assert_eq!(values.len(), 500);
            for (i, v) in values.iter().enumerate() {
                assert_eq!(*v, i % 2 == 0, "{action} notification {i} out of order");
            }
            assert!(!state.get(action));
        }
    }

    #[test]
    fn test_panicking_observer_does_not_starve_later_observers() {
        struct Panics;
        impl ActionObserver for Panics {
            fn on_action_changed(&self, _: Action, _: bool) {
                panic!("observer failure");
            }
        }

        // Arrange
        let state = HeldActionState::new();
        let recorder = Arc::new(RecordingObserver::default());
        state.subscribe(Action::LeftButton, Arc::new(Panics));
        state.subscribe(Action::LeftButton, Arc::clone(&recorder) as Arc<dyn ActionObserver>);

        // Act
        let pressed = state.set(Action::LeftButton, true);
        let released = state.set(Action::LeftButton, false);

        // Assert
        assert!(pressed && released);
        assert_eq!(
            recorder.events(),
            vec![(Action::LeftButton, true), (Action::LeftButton, false)]
        );
        assert!(!state.get(Action::LeftButton));
        assert_eq!(state.observer_count(Action::LeftButton), 2);
    }
}
