//! Windows Virtual Key (VK) codes used by the default action table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//! Windows VK codes range from 0x00 to 0xFF, so a key → action table is a
//! 256-entry array indexed by the code.
//!
//! The default table binds the twelve function keys F13–F24 to the pointer
//! actions.  Those keys do not exist on most physical keyboards, which makes
//! them safe to produce from a programmable keyboard or a macro pad without
//! colliding with normal typing.  The speed modifiers sit on Shift and Ctrl,
//! and both the left- and right-hand variants engage the same action.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// A Windows Virtual Key code as delivered by a low-level keyboard hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VirtualKey(pub u8);

impl VirtualKey {
    pub const F13: VirtualKey = VirtualKey(0x7C);
    pub const F14: VirtualKey = VirtualKey(0x7D);
    pub const F15: VirtualKey = VirtualKey(0x7E);
    pub const F16: VirtualKey = VirtualKey(0x7F);
    pub const F17: VirtualKey = VirtualKey(0x80);
    pub const F18: VirtualKey = VirtualKey(0x81);
    pub const F19: VirtualKey = VirtualKey(0x82);
    pub const F20: VirtualKey = VirtualKey(0x83);
    pub const F21: VirtualKey = VirtualKey(0x84);
    pub const F22: VirtualKey = VirtualKey(0x85);
    pub const F23: VirtualKey = VirtualKey(0x86);
    pub const F24: VirtualKey = VirtualKey(0x87);
    pub const LSHIFT: VirtualKey = VirtualKey(0xA0);
    pub const RSHIFT: VirtualKey = VirtualKey(0xA1);
    pub const LCONTROL: VirtualKey = VirtualKey(0xA2);
    pub const RCONTROL: VirtualKey = VirtualKey(0xA3);

    /// The raw code.
    pub const fn code(self) -> u8 {
        self.0
    }
}

impl fmt::Display for VirtualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VK 0x{:02X}", self.0)
    }
}

/// The compiled-in bindings.
///
/// Order matters: the first binding of an action is its primary key, which is
/// what [`super::KeyMapping::key_for`] returns.
pub const DEFAULT_BINDINGS: [(VirtualKey, Action); 16] = [
    (VirtualKey::F13, Action::MoveUp),
    (VirtualKey::F14, Action::MoveDown),
    (VirtualKey::F15, Action::MoveLeft),
    (VirtualKey::F16, Action::MoveRight),
    (VirtualKey::F17, Action::LeftButton),
    (VirtualKey::F18, Action::RightButton),
    (VirtualKey::F19, Action::MiddleButton),
    (VirtualKey::F20, Action::DoubleClick),
    (VirtualKey::F21, Action::ScrollUp),
    (VirtualKey::F22, Action::ScrollDown),
    (VirtualKey::F23, Action::ShowUiLabels),
    (VirtualKey::F24, Action::ShowGridLabels),
    (VirtualKey::LSHIFT, Action::SpeedUp),
    (VirtualKey::RSHIFT, Action::SpeedUp),
    (VirtualKey::LCONTROL, Action::SpeedDown),
    (VirtualKey::RCONTROL, Action::SpeedDown),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_keys_are_contiguous() {
        assert_eq!(VirtualKey::F24.code() - VirtualKey::F13.code(), 11);
    }

    #[test]
    fn test_display_formats_hex_code() {
        assert_eq!(VirtualKey::F13.to_string(), "VK 0x7C");
    }

    #[test]
    fn test_default_bindings_cover_every_action() {
        for action in Action::ALL {
            assert!(
                DEFAULT_BINDINGS.iter().any(|&(_, a)| a == action),
                "{action} has no default binding"
            );
        }
    }
}
