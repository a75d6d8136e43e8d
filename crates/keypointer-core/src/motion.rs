//! Pointer-motion arithmetic.
//!
//! Everything the motion loop computes per tick lives here as pure functions
//! so it can be tested without threads or an OS cursor:
//!
//! 1. [`HeldSnapshot::capture`] reads the four directions and two speed
//!    modifiers once at the top of the tick.
//! 2. [`MotionParams::speed_for`] combines the modifiers multiplicatively.
//! 3. [`MotionParams::planned_moves`] yields one independent move per held
//!    direction, in the order Up, Left, Down, Right.
//! 4. [`apply_move`] adds a move to the current cursor position and rounds to
//!    the nearest pixel.
//!
//! Each move is applied to a freshly read cursor position, so holding Up and
//! Down together nudges the cursor up and straight back down within one tick.
//!
//! # Rounding
//!
//! By default the fractional part of a move is discarded.  At low speeds this
//! under-moves (2.4 px per tick becomes 2 px).  [`SubpixelCarry`] keeps the
//! remainder per axis instead; it is opt-in.

use std::time::Duration;

use crate::action::Action;
use crate::state::HeldActionState;

/// Pixels per tick with no modifier held.
pub const BASE_SPEED: f64 = 8.0;
/// Multiplier while [`Action::SpeedUp`] is held.
pub const SPEED_UP_MULTIPLIER: f64 = 3.0;
/// Multiplier while [`Action::SpeedDown`] is held.
pub const SPEED_DOWN_MULTIPLIER: f64 = 0.3;
/// Period of the motion loop.
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables of the motion loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub base_speed: f64,
    pub speed_up_multiplier: f64,
    pub speed_down_multiplier: f64,
    pub tick: Duration,
    /// Carry sub-pixel remainders across moves instead of discarding them.
    pub carry_subpixel_remainder: bool,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            base_speed: BASE_SPEED,
            speed_up_multiplier: SPEED_UP_MULTIPLIER,
            speed_down_multiplier: SPEED_DOWN_MULTIPLIER,
            tick: TICK_INTERVAL,
            carry_subpixel_remainder: false,
        }
    }
}

/// The held state of the motion-relevant actions at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub speed_up: bool,
    pub speed_down: bool,
}

impl HeldSnapshot {
    /// Reads the six motion latches from `state`.
    pub fn capture(state: &HeldActionState) -> Self {
        Self {
            up: state.get(Action::MoveUp),
            down: state.get(Action::MoveDown),
            left: state.get(Action::MoveLeft),
            right: state.get(Action::MoveRight),
            speed_up: state.get(Action::SpeedUp),
            speed_down: state.get(Action::SpeedDown),
        }
    }

    /// `true` if any direction is held.
    pub fn any_direction(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// A single cursor displacement in fractional pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedMove {
    pub dx: f64,
    pub dy: f64,
}

impl MotionParams {
    /// Pixels per tick for the given modifier state.
    ///
    /// Both modifiers may apply at once: `base * up * down`.
    pub fn speed_for(&self, held: HeldSnapshot) -> f64 {
        let mut speed = self.base_speed;
        if held.speed_up {
            speed *= self.speed_up_multiplier;
        }
        if held.speed_down {
            speed *= self.speed_down_multiplier;
        }
        speed
    }

    /// One move per held direction, in the order Up, Left, Down, Right.
    pub fn planned_moves(&self, held: HeldSnapshot) -> impl Iterator<Item = PlannedMove> {
        let speed = self.speed_for(held);
        [
            (held.up, PlannedMove { dx: 0.0, dy: -speed }),
            (held.left, PlannedMove { dx: -speed, dy: 0.0 }),
            (held.down, PlannedMove { dx: 0.0, dy: speed }),
            (held.right, PlannedMove { dx: speed, dy: 0.0 }),
        ]
        .into_iter()
        .filter_map(|(on, mv)| on.then_some(mv))
    }
}

/// Applies `mv` to `pos`, rounding each axis to the nearest pixel.
///
/// The fractional part is discarded.
pub fn apply_move(pos: (i32, i32), mv: PlannedMove) -> (i32, i32) {
    (
        round_px(f64::from(pos.0) + mv.dx),
        round_px(f64::from(pos.1) + mv.dy),
    )
}

fn round_px(v: f64) -> i32 {
    v.round() as i32
}

/// Per-axis fractional remainder carried between moves.
///
/// Lives as long as one motion session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubpixelCarry {
    x: f64,
    y: f64,
}

impl SubpixelCarry {
    /// Like [`apply_move`], but adds the carried remainder first and keeps the
    /// new remainder.
    pub fn apply(&mut self, pos: (i32, i32), mv: PlannedMove) -> (i32, i32) {
        let exact_x = f64::from(pos.0) + mv.dx + self.x;
        let exact_y = f64::from(pos.1) + mv.dy + self.y;
        let x = round_px(exact_x);
        let y = round_px(exact_y);
        self.x = exact_x - f64::from(x);
        self.y = exact_y - f64::from(y);
        (x, y)
    }
}
