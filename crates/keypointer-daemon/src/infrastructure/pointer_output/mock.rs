//! In-memory pointer backend for tests.
//!
//! [`RecordingPointerBackend`] keeps a simulated cursor position and pushes
//! every write and injected event into a `Mutex<Vec<...>>`, so assertions can
//! check exactly what was emitted and in which order.  Cursor writes update
//! the simulated position, which makes read-modify-write sequences behave as
//! they would against the real cursor.
//!
//! `fail_reads` / `fail_writes` simulate OS failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::application::{MouseButton, PointerBackend, PointerError};

/// One injected button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonRecord {
    pub button: MouseButton,
    pub pressed: bool,
    pub x: i32,
    pub y: i32,
}

/// One injected wheel rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelRecord {
    pub delta: i16,
    pub x: i32,
    pub y: i32,
}

/// A pointer backend that records all calls without touching the OS.
#[derive(Debug, Default)]
pub struct RecordingPointerBackend {
    position: Mutex<(i32, i32)>,
    cursor_sets: Mutex<Vec<(i32, i32)>>,
    buttons: Mutex<Vec<ButtonRecord>>,
    wheels: Mutex<Vec<WheelRecord>>,
    /// When set, `cursor_position` fails.
    pub fail_reads: AtomicBool,
    /// When set, every write and injection fails.
    pub fail_writes: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingPointerBackend {
    /// Creates a backend with the cursor at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with the cursor at `(x, y)`.
    pub fn at(x: i32, y: i32) -> Self {
        let backend = Self::default();
        *lock(&backend.position) = (x, y);
        backend
    }

    /// Moves the simulated cursor without recording a write, as if the user
    /// moved the physical mouse.
    pub fn move_to(&self, x: i32, y: i32) {
        *lock(&self.position) = (x, y);
    }

    pub fn position(&self) -> (i32, i32) {
        *lock(&self.position)
    }

    /// Every position passed to `set_cursor_position`, in order.
    pub fn cursor_sets(&self) -> Vec<(i32, i32)> {
        lock(&self.cursor_sets).clone()
    }

    pub fn buttons(&self) -> Vec<ButtonRecord> {
        lock(&self.buttons).clone()
    }

    pub fn wheels(&self) -> Vec<WheelRecord> {
        lock(&self.wheels).clone()
    }

    fn check_write(&self) -> Result<(), PointerError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(PointerError::Platform("mock write failure".into()));
        }
        Ok(())
    }
}

impl PointerBackend for RecordingPointerBackend {
    fn cursor_position(&self) -> Result<(i32, i32), PointerError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(PointerError::Platform("mock read failure".into()));
        }
        Ok(self.position())
    }

    fn set_cursor_position(&self, x: i32, y: i32) -> Result<(), PointerError> {
        self.check_write()?;
        // Record and move under one lock order so readers never see a write
        // that is missing from the log.
        let mut sets = lock(&self.cursor_sets);
        *lock(&self.position) = (x, y);
        sets.push((x, y));
        Ok(())
    }

    fn emit_button(
        &self,
        button: MouseButton,
        pressed: bool,
        x: i32,
        y: i32,
    ) -> Result<(), PointerError> {
        self.check_write()?;
        lock(&self.buttons).push(ButtonRecord {
            button,
            pressed,
            x,
            y,
        });
        Ok(())
    }

    fn emit_wheel(&self, delta: i16, x: i32, y: i32) -> Result<(), PointerError> {
        self.check_write()?;
        lock(&self.wheels).push(WheelRecord { delta, x, y });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cursor_updates_position_and_log() {
        // Arrange
        let backend = RecordingPointerBackend::at(5, 5);

        // Act
        backend.set_cursor_position(7, 9).unwrap();

        // Assert
        assert_eq!(backend.cursor_position().unwrap(), (7, 9));
        assert_eq!(backend.cursor_sets(), vec![(7, 9)]);
    }

    #[test]
    fn test_move_to_is_not_recorded_as_a_write() {
        let backend = RecordingPointerBackend::new();
        backend.move_to(3, 4);
        assert_eq!(backend.position(), (3, 4));
        assert!(backend.cursor_sets().is_empty());
    }

    #[test]
    fn test_fail_flags_return_platform_errors() {
        let backend = RecordingPointerBackend::new();
        backend.fail_reads.store(true, Ordering::Relaxed);
        backend.fail_writes.store(true, Ordering::Relaxed);

        assert!(backend.cursor_position().is_err());
        assert!(backend.set_cursor_position(1, 1).is_err());
        assert!(backend.emit_button(MouseButton::Left, true, 0, 0).is_err());
        assert!(backend.emit_wheel(120, 0, 0).is_err());
        assert!(backend.cursor_sets().is_empty());
        assert!(backend.buttons().is_empty());
        assert!(backend.wheels().is_empty());
    }
}
