//! KeyPointer daemon entry point.
//!
//! Drives the mouse pointer from the keyboard: a system-wide keyboard hook
//! feeds key events into the action dispatcher, and the pointer drivers turn
//! held actions into cursor motion, clicks and wheel notches.
//!
//! # Usage
//!
//! ```text
//! keypointer [OPTIONS]
//!
//! Options:
//!   --config <PATH>          Config file [env: KEYPOINTER_CONFIG]
//!   --write-default-config   Write the default config to the config path and exit
//! ```
//!
//! Log verbosity comes from `RUST_LOG` when set, otherwise from
//! `daemon.log_level` in the config file.
//!
//! # Thread layout
//!
//! ```text
//! keypointer-hook      Win32 message loop, WH_KEYBOARD_LL callback
//!        │ mpsc
//! keypointer-dispatch  ActionDispatcher::pump → latches → observers
//!        │ start/stop
//! keypointer-motion    one per motion session, ticks every 10 ms
//! tokio runtime        signal handling, label-toggle consumer
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use keypointer_core::{HeldActionState, KeyMapping};
use keypointer_daemon::application::dispatch_actions::ActionDispatcher;
use keypointer_daemon::application::drive_pointer::PointerMotionDriver;
use keypointer_daemon::application::emulate_buttons::ButtonEmulationDriver;
use keypointer_daemon::infrastructure::input_capture::platform_key_source;
use keypointer_daemon::infrastructure::pointer_output::platform_pointer_backend;
use keypointer_daemon::infrastructure::storage::config::{self, AppConfig};
use keypointer_daemon::infrastructure::ui_bridge::{LabelToggleBridge, DEFAULT_CAPACITY};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Keyboard-driven mouse pointer daemon.
#[derive(Debug, Parser)]
#[command(name = "keypointer", about = "Drive the mouse pointer from the keyboard", version)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// Defaults to `config.toml` in the platform config directory.
    #[arg(long, env = "KEYPOINTER_CONFIG")]
    config: Option<PathBuf>,

    /// Write the default configuration to the config path and exit.
    #[arg(long)]
    write_default_config: bool,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config::config_file_path().context("no --config given"),
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path()?;

    if cli.write_default_config {
        config::save_config_to(&AppConfig::default(), &config_path)
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }

    let cfg = config::load_config_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    cfg.validate().context("validating configuration")?;

    init_tracing(&cfg.daemon.log_level);
    info!(config = %config_path.display(), "KeyPointer starting");

    // ── State and drivers ─────────────────────────────────────────────────────
    let state = Arc::new(HeldActionState::new());
    let backend = platform_pointer_backend().context("creating pointer backend")?;

    let motion = PointerMotionDriver::attach(&state, Arc::clone(&backend), cfg.motion.to_params());
    let _buttons = ButtonEmulationDriver::attach(&state, Arc::clone(&backend));
    let (_labels, mut label_rx) = LabelToggleBridge::attach(&state, DEFAULT_CAPACITY);

    // No overlay is attached to this binary; the toggles are only logged.
    tokio::spawn(async move {
        while let Some(toggle) = label_rx.recv().await {
            info!(action = %toggle.action, visible = toggle.visible, "label overlay toggled");
        }
        debug!("label channel closed");
    });

    // ── Key capture and dispatch ──────────────────────────────────────────────
    let source = platform_key_source().context("creating key source")?;
    let events = source.start().context("starting keyboard hook")?;

    let dispatcher = Arc::new(ActionDispatcher::new(KeyMapping::default(), Arc::clone(&state)));
    let pump = Arc::clone(&dispatcher)
        .spawn_pump(events)
        .context("spawning dispatch thread")?;

    info!("KeyPointer ready.  Press Ctrl-C to exit.");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("shutdown signal received");

    // Stopping the source disconnects the channel, which ends the pump.
    source.stop();
    let processed = tokio::task::spawn_blocking(move || pump.join())
        .await
        .context("joining dispatch thread")?
        .map_err(|_| anyhow::anyhow!("dispatch thread panicked"))?;

    // The pump has exited, so this is the only writer left.
    dispatcher.release_all();
    motion.stop();

    info!(processed, sessions = motion.sessions_started(), "KeyPointer stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
