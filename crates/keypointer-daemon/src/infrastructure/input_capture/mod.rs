//! Keyboard capture infrastructure.
//!
//! On Windows this installs a low-level keyboard hook (`WH_KEYBOARD_LL`) on a
//! dedicated Win32 message-loop thread.  The hook callback only copies the
//! event into a channel and forwards it down the hook chain; it never
//! suppresses a key and never blocks, because a slow callback stalls keyboard
//! delivery for the whole desktop (and Windows removes hooks that take longer
//! than ~300ms).
//!
//! The receiving end is drained by
//! [`crate::application::dispatch_actions::ActionDispatcher::pump`].
//!
//! # Testability
//!
//! The [`KeySource`] trait lets tests inject synthetic events through
//! [`mock::MockKeySource`] without any OS hook.

use std::sync::mpsc;

use keypointer_core::{KeyEventKind, VirtualKey};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// A raw key event as seen by the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// Windows Virtual Key code.
    pub vk_code: VirtualKey,
    pub kind: KeyEventKind,
    /// Milliseconds since system start (from the hook struct).
    pub time_ms: u32,
}

impl RawKeyEvent {
    pub fn pressed(vk_code: VirtualKey) -> Self {
        Self {
            vk_code,
            kind: KeyEventKind::Pressed,
            time_ms: 0,
        }
    }

    pub fn released(vk_code: VirtualKey) -> Self {
        Self {
            vk_code,
            kind: KeyEventKind::Released,
            time_ms: 0,
        }
    }
}

/// Error type for key capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to install keyboard hook: {0}")]
    HookInstallFailed(String),
    #[error("a key source is already running")]
    AlreadyRunning,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Produces raw key events until stopped.
///
/// Events keep arriving until [`KeySource::stop`] is called; after that the
/// receiver returned by [`KeySource::start`] disconnects.
pub trait KeySource: Send + Sync {
    /// Starts the source and returns a receiver for captured events.
    fn start(&self) -> Result<mpsc::Receiver<RawKeyEvent>, CaptureError>;
    /// Stops the source and releases all OS resources before returning.
    fn stop(&self);
}

/// Returns the key source for the current platform.
///
/// # Errors
///
/// Returns [`CaptureError::UnsupportedPlatform`] where no system-wide keyboard
/// hook is implemented.
pub fn platform_key_source() -> Result<Box<dyn KeySource>, CaptureError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::WindowsKeyHookSource::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(CaptureError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}
