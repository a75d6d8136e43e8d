//! Storage infrastructure: the daemon's TOML configuration file.
//!
//! Only daemon and motion tunables are stored.  Key bindings are fixed at
//! compile time and are not read from disk.

pub mod config;
