//! Logical actions and raw key event kinds.
//!
//! An [`Action`] is an input intent decoupled from the physical key producing
//! it.  The set is closed and fixed at compile time; every table in the crate
//! is indexed by [`Action::index`] and sized by [`Action::COUNT`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::keymap::KeyMapError;

/// A logical input intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    MoveUp = 0,
    MoveDown = 1,
    MoveLeft = 2,
    MoveRight = 3,
    SpeedUp = 4,
    SpeedDown = 5,
    LeftButton = 6,
    RightButton = 7,
    MiddleButton = 8,
    DoubleClick = 9,
    ScrollUp = 10,
    ScrollDown = 11,
    /// Show hint labels over clickable UI elements.
    ShowUiLabels = 12,
    /// Show the grid navigation labels.
    ShowGridLabels = 13,
}

impl Action {
    /// Number of actions; the length of every per-action table.
    pub const COUNT: usize = 14;

    /// All actions in declaration order.
    pub const ALL: [Action; Action::COUNT] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveLeft,
        Action::MoveRight,
        Action::SpeedUp,
        Action::SpeedDown,
        Action::LeftButton,
        Action::RightButton,
        Action::MiddleButton,
        Action::DoubleClick,
        Action::ScrollUp,
        Action::ScrollDown,
        Action::ShowUiLabels,
        Action::ShowGridLabels,
    ];

    /// The four directional actions that drive the motion loop.
    pub const DIRECTIONS: [Action; 4] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveLeft,
        Action::MoveRight,
    ];

    /// Actions translated into synthesized mouse button or wheel input.
    pub const BUTTONS: [Action; 6] = [
        Action::LeftButton,
        Action::RightButton,
        Action::MiddleButton,
        Action::DoubleClick,
        Action::ScrollUp,
        Action::ScrollDown,
    ];

    /// Actions consumed by the hint overlay.
    pub const LABEL_TOGGLES: [Action; 2] = [Action::ShowUiLabels, Action::ShowGridLabels];

    /// Dense index of this action, in `0..Action::COUNT`.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for the four cursor-moving actions.
    pub const fn is_direction(self) -> bool {
        matches!(
            self,
            Action::MoveUp | Action::MoveDown | Action::MoveLeft | Action::MoveRight
        )
    }

    /// Returns `true` for the two speed modifiers.
    pub const fn is_speed_modifier(self) -> bool {
        matches!(self, Action::SpeedUp | Action::SpeedDown)
    }

    /// Stable lowercase name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Action::MoveUp => "move-up",
            Action::MoveDown => "move-down",
            Action::MoveLeft => "move-left",
            Action::MoveRight => "move-right",
            Action::SpeedUp => "speed-up",
            Action::SpeedDown => "speed-down",
            Action::LeftButton => "left-button",
            Action::RightButton => "right-button",
            Action::MiddleButton => "middle-button",
            Action::DoubleClick => "double-click",
            Action::ScrollUp => "scroll-up",
            Action::ScrollDown => "scroll-down",
            Action::ShowUiLabels => "show-ui-labels",
            Action::ShowGridLabels => "show-grid-labels",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = KeyMapError;

    /// Parses the name produced by [`Action::name`].
    ///
    /// # Errors
    ///
    /// Returns [`KeyMapError::UnknownAction`] for any other string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| KeyMapError::UnknownAction(s.to_string()))
    }
}

/// Whether a raw key event was a press or a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEventKind {
    Pressed,
    Released,
}

impl KeyEventKind {
    /// `true` for [`KeyEventKind::Pressed`].
    pub const fn is_pressed(self) -> bool {
        matches!(self, KeyEventKind::Pressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_ordered_by_index() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i, "{action} is out of place in Action::ALL");
        }
    }

    #[test]
    fn test_count_covers_every_variant() {
        // Exhaustive: a new variant fails to compile here until it is placed.
        fn position(action: Action) -> usize {
            match action {
                Action::MoveUp => 0,
                Action::MoveDown => 1,
                Action::MoveLeft => 2,
                Action::MoveRight => 3,
                Action::SpeedUp => 4,
                Action::SpeedDown => 5,
                Action::LeftButton => 6,
                Action::RightButton => 7,
                Action::MiddleButton => 8,
                Action::DoubleClick => 9,
                Action::ScrollUp => 10,
                Action::ScrollDown => 11,
                Action::ShowUiLabels => 12,
                Action::ShowGridLabels => 13,
            }
        }

        assert_eq!(Action::ShowGridLabels.index() + 1, Action::COUNT);
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(position(*action), i);
        }
    }

    #[test]
    fn test_directions_are_exactly_the_move_actions() {
        let directions: Vec<Action> = Action::ALL
            .iter()
            .copied()
            .filter(|a| a.is_direction())
            .collect();
        assert_eq!(directions, Action::DIRECTIONS.to_vec());
    }

    #[test]
    fn test_speed_modifiers_are_not_directions() {
        assert!(Action::SpeedUp.is_speed_modifier());
        assert!(Action::SpeedDown.is_speed_modifier());
        assert!(!Action::SpeedUp.is_direction());
        assert!(!Action::MoveUp.is_speed_modifier());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = Action::ALL.iter().map(|a| a.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Action::COUNT);
    }

    #[test]
    fn test_from_str_parses_every_name() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown_name() {
        let err = "move-diagonal".parse::<Action>().unwrap_err();
        assert!(matches!(err, KeyMapError::UnknownAction(ref s) if s == "move-diagonal"));
    }

    #[test]
    fn test_key_event_kind_is_pressed() {
        assert!(KeyEventKind::Pressed.is_pressed());
        assert!(!KeyEventKind::Released.is_pressed());
    }
}
