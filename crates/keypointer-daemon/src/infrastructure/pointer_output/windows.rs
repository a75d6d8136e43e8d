//! Windows pointer backend.
//!
//! Cursor reads and writes go through `GetCursorPos`/`SetCursorPos` in
//! virtual-screen pixels.  Buttons and wheel notches are injected with
//! `SendInput` without a position: the OS applies them at the live cursor.

#![cfg(target_os = "windows")]

use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEEVENTF_WHEEL, MOUSEINPUT, MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

use crate::application::{MouseButton, PointerBackend, PointerError};

/// [`PointerBackend`] backed by the Win32 cursor and `SendInput`.
pub struct WindowsPointerBackend;

impl WindowsPointerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsPointerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerBackend for WindowsPointerBackend {
    fn cursor_position(&self) -> Result<(i32, i32), PointerError> {
        let mut point = POINT::default();
        // SAFETY: point is a valid, writable POINT on the stack.
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| PointerError::Platform(format!("GetCursorPos: {e}")))?;
        Ok((point.x, point.y))
    }

    fn set_cursor_position(&self, x: i32, y: i32) -> Result<(), PointerError> {
        // SAFETY: SetCursorPos takes plain integers.
        unsafe { SetCursorPos(x, y) }
            .map_err(|e| PointerError::Platform(format!("SetCursorPos: {e}")))
    }

    fn emit_button(
        &self,
        button: MouseButton,
        pressed: bool,
        _x: i32,
        _y: i32,
    ) -> Result<(), PointerError> {
        send_mouse(button_flags(button, pressed), 0)
    }

    fn emit_wheel(&self, delta: i16, _x: i32, _y: i32) -> Result<(), PointerError> {
        // mouseData carries the signed delta reinterpreted as a DWORD.
        send_mouse(MOUSEEVENTF_WHEEL, delta as i32 as u32)
    }
}

fn button_flags(button: MouseButton, pressed: bool) -> MOUSE_EVENT_FLAGS {
    match (button, pressed) {
        (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
        (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
        (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
        (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
        (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
        (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
    }
}

fn send_mouse(flags: MOUSE_EVENT_FLAGS, mouse_data: u32) -> Result<(), PointerError> {
    let input = INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: mouse_data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };
    // SAFETY: input is a valid INPUT structure on the stack.
    let inserted = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if inserted == 0 {
        return Err(PointerError::Platform(format!(
            "SendInput rejected {:?}: {}",
            flags,
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}
