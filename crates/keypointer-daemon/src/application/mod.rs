//! Application layer of the daemon.
//!
//! The use cases here depend only on `keypointer_core` and on the
//! [`PointerBackend`] trait; the OS hook and the cursor/button injection are
//! supplied by the infrastructure layer at construction time, which keeps
//! every use case testable with the recording mocks.
//!
//! # Sub-modules
//!
//! - **`dispatch_actions`** – Turns raw key events into held-state changes.
//!   This runs for every key event on the system, mapped or not.
//!
//! - **`drive_pointer`** – Owns the motion loop: starts it when a direction
//!   becomes held, stops it synchronously when none is.
//!
//! - **`emulate_buttons`** – Turns button, double-click and scroll transitions
//!   into synthesized mouse input.
//!
//! - **`pointer_backend`** – The trait seam to the OS cursor and mouse input.

pub mod dispatch_actions;
pub mod drive_pointer;
pub mod emulate_buttons;
pub mod pointer_backend;

pub use pointer_backend::{MouseButton, PointerBackend, PointerError};
