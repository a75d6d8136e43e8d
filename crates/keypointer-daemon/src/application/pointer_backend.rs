//! The seam between the drivers and the OS pointer.

use thiserror::Error;

/// Error type for pointer read/write and input injection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Mouse buttons the daemon can synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// One wheel notch, in the Windows `WHEEL_DELTA` unit.
pub const WHEEL_DELTA: i16 = 120;

/// Reads and moves the OS cursor and injects mouse input.
///
/// The cursor is a global resource shared with every other program; a read
/// followed by a write is not atomic with respect to them.
#[cfg_attr(test, mockall::automock)]
pub trait PointerBackend: Send + Sync {
    /// Returns the current cursor position in screen pixels.
    fn cursor_position(&self) -> Result<(i32, i32), PointerError>;

    /// Moves the cursor to an absolute position in screen pixels.
    fn set_cursor_position(&self, x: i32, y: i32) -> Result<(), PointerError>;

    /// Injects a button press (`pressed = true`) or release.
    ///
    /// `(x, y)` is the cursor position sampled when the transition happened.
    fn emit_button(
        &self,
        button: MouseButton,
        pressed: bool,
        x: i32,
        y: i32,
    ) -> Result<(), PointerError>;

    /// Injects a vertical wheel rotation; positive scrolls away from the user.
    fn emit_wheel(&self, delta: i16, x: i32, y: i32) -> Result<(), PointerError>;
}
