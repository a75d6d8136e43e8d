//! # keypointer-core
//!
//! Shared library for KeyPointer containing the logical action model, the
//! physical-key-to-action table, the held-action latches and the pure
//! pointer-motion arithmetic.
//!
//! It has zero dependencies on OS APIs, threads or UI frameworks; the
//! `keypointer-daemon` crate supplies the keyboard hook, the motion loop
//! thread and the cursor/button injection.
//!
//! # Architecture overview
//!
//! KeyPointer lets a keyboard drive the mouse.  Holding a mapped key engages a
//! logical [`Action`] (move up, left button, speed up, ...); while directional
//! actions are held the cursor is nudged every tick, and button actions are
//! turned into synthesized button presses.
//!
//! - **`action`** – The closed set of logical inputs and the press/release kind
//!   of a raw key event.
//!
//! - **`keymap`** – The bidirectional table between Windows virtual-key codes and
//!   actions.  Key → action is an O(1) array index because it runs for every key
//!   event the hook sees system-wide.
//!
//! - **`state`** – One observable boolean latch per action.  This is the single
//!   source of truth for "is this action currently engaged".
//!
//! - **`motion`** – Speed combination, per-tick move planning and rounding.

pub mod action;
pub mod keymap;
pub mod motion;
pub mod state;

pub use action::{Action, KeyEventKind};
pub use keymap::{KeyMapError, KeyMapping, VirtualKey};
pub use motion::{HeldSnapshot, MotionParams, PlannedMove};
pub use state::{ActionObserver, HeldActionState};
