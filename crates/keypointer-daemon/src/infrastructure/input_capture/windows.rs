//! Windows low-level keyboard hook implementation.
//!
//! This module installs a `WH_KEYBOARD_LL` hook on a dedicated Win32
//! message-loop thread.  The callback forwards every key-down/key-up into the
//! event channel and always passes the event on with `CallNextHookEx`: the
//! daemon observes keys, it never swallows them.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use keypointer_core::{KeyEventKind, VirtualKey};
use tracing::{debug, error};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, MSG, PM_NOREMOVE,
    WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN, WM_SYSKEYUP, WM_USER,
};

use super::{CaptureError, KeySource, RawKeyEvent};

/// Sender used by the hook callback to deliver events to the dispatcher.
///
/// The callback is a bare `extern "system"` function with no user data, so the
/// channel has to be reachable from a static.  `stop()` takes the sender out,
/// which disconnects the receiver.
static EVENT_SENDER: Mutex<Option<Sender<RawKeyEvent>>> = Mutex::new(None);

/// Windows low-level keyboard capture service.
pub struct WindowsKeyHookSource {
    /// Win32 thread id of the message loop, or 0 when not running.
    hook_thread_id: AtomicU32,
    /// The message loop thread; joined by `stop()` after the hook is removed.
    hook_thread: Mutex<Option<JoinHandle<()>>>,
}

impl WindowsKeyHookSource {
    /// Creates a new (unstarted) source.
    pub fn new() -> Self {
        Self {
            hook_thread_id: AtomicU32::new(0),
            hook_thread: Mutex::new(None),
        }
    }

    /// `true` while the hook thread is alive.
    pub fn is_running(&self) -> bool {
        self.hook_thread().is_some()
    }

    fn hook_thread(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.hook_thread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join_hook_thread(&self) {
        if let Some(handle) = self.hook_thread().take() {
            if handle.join().is_err() {
                error!("keyboard hook thread panicked");
            }
        }
    }
}

impl Default for WindowsKeyHookSource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for WindowsKeyHookSource {
    fn start(&self) -> Result<mpsc::Receiver<RawKeyEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel::<RawKeyEvent>();
        {
            let mut slot = EVENT_SENDER.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return Err(CaptureError::AlreadyRunning);
            }
            *slot = Some(tx);
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, String>>();
        let spawned = thread::Builder::new()
            .name("keypointer-hook".to_string())
            .spawn(move || run_hook_message_loop(ready_tx));
        match spawned {
            Ok(handle) => *self.hook_thread() = Some(handle),
            Err(e) => {
                clear_sender();
                return Err(CaptureError::HookInstallFailed(e.to_string()));
            }
        }

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                self.hook_thread_id.store(thread_id, Ordering::SeqCst);
                debug!(thread_id, "keyboard hook installed");
                Ok(rx)
            }
            Ok(Err(reason)) => {
                clear_sender();
                self.join_hook_thread();
                Err(CaptureError::HookInstallFailed(reason))
            }
            Err(_) => {
                clear_sender();
                self.join_hook_thread();
                Err(CaptureError::HookInstallFailed(
                    "hook thread exited before reporting".to_string(),
                ))
            }
        }
    }

    fn stop(&self) {
        let thread_id = self.hook_thread_id.swap(0, Ordering::SeqCst);
        if thread_id != 0 {
            // SAFETY: posting WM_QUIT to a thread id we obtained from that thread.
            if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
                error!("failed to stop keyboard hook thread: {e}");
            }
        }
        clear_sender();
        // The loop unhooks before it exits, so the hook is gone once this returns.
        self.join_hook_thread();
    }
}

fn clear_sender() {
    EVENT_SENDER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
}

/// Entry point for the dedicated Win32 message loop thread.
fn run_hook_message_loop(ready: Sender<Result<u32, String>>) {
    let mut msg = MSG::default();

    // SAFETY: forces creation of this thread's message queue so that
    // PostThreadMessageW from `stop()` cannot race the first GetMessageW.
    unsafe {
        let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
    }

    // SAFETY: SetWindowsHookExW requires the calling thread to pump messages,
    // which the loop below does until WM_QUIT.
    let hook = match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) } {
        Ok(hook) => hook,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };
    let _ = ready.send(Ok(thread_id));

    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            DispatchMessageW(&msg);
        }
        UnhookWindowsHookEx(hook).ok();
    }
    debug!("keyboard hook removed");
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// This function is called by Windows from the hook message loop thread.
/// It must return quickly to avoid stalling keyboard input system-wide.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 {
        // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
        let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);

        let kind = match w_param.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => Some(KeyEventKind::Pressed),
            WM_KEYUP | WM_SYSKEYUP => Some(KeyEventKind::Released),
            _ => None,
        };

        if let Some(kind) = kind {
            let event = RawKeyEvent {
                vk_code: VirtualKey(kbs.vkCode as u8),
                kind,
                time_ms: kbs.time,
            };
            if let Some(sender) = EVENT_SENDER
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_ref()
            {
                // Ignore send errors (receiver dropped during shutdown).
                let _ = sender.send(event);
            }
        }
    }

    // SAFETY: Forward the event to the next hook in the chain; keys are never consumed.
    CallNextHookEx(None, n_code, w_param, l_param)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_joins_hook_thread_and_allows_restart() {
        // Arrange
        let source = WindowsKeyHookSource::new();
        let Ok(_events) = source.start() else {
            // No interactive desktop to hook; nothing to verify.
            return;
        };
        assert!(source.is_running());

        // Act
        source.stop();

        // Assert
        assert!(!source.is_running());
        assert_eq!(source.hook_thread_id.load(Ordering::SeqCst), 0);
        let restarted = source.start();
        assert!(restarted.is_ok());
        source.stop();
        assert!(!source.is_running());
    }
}
