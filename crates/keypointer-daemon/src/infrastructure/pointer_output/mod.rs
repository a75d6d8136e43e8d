//! OS pointer backends.
//!
//! The Windows backend reads and writes the cursor with
//! `GetCursorPos`/`SetCursorPos` and injects buttons and wheel notches with
//! `SendInput`.  [`mock::RecordingPointerBackend`] records everything in memory
//! for tests.

use std::sync::Arc;

use crate::application::{PointerBackend, PointerError};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Returns the pointer backend for the current platform.
///
/// # Errors
///
/// Returns [`PointerError::UnsupportedPlatform`] where no backend exists.
pub fn platform_pointer_backend() -> Result<Arc<dyn PointerBackend>, PointerError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsPointerBackend::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(PointerError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_platform_pointer_backend_is_unsupported_off_windows() {
        use super::*;
        assert!(matches!(
            platform_pointer_backend(),
            Err(PointerError::UnsupportedPlatform(_))
        ));
    }
}
