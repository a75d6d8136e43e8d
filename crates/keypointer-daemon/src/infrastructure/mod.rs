//! Infrastructure layer for the daemon.
//!
//! Contains OS-facing adapters: the keyboard hook, cursor and mouse-input
//! injection, configuration storage, and the channel that hands label-toggle
//! actions to the overlay.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keypointer_core`; the drivers in `application` only see it through the
//! [`crate::application::PointerBackend`] trait and the raw event channel.

pub mod input_capture;
pub mod pointer_output;
pub mod storage;
pub mod ui_bridge;
