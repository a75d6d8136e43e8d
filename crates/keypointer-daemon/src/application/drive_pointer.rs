//! PointerMotionDriver: turns held directional actions into continuous cursor
//! motion.
//!
//! # State machine
//!
//! ```text
//!            any direction held
//!   Idle  ─────────────────────────▶  Moving (one MotionLoopHandle)
//!         ◀─────────────────────────
//!            no direction held (loop stopped and joined)
//! ```
//!
//! The driver observes the four directions and both speed modifiers.  On every
//! notification it re-evaluates "is any direction held" under its own mutex and
//! moves between the two states.  The only place a loop is started is
//! [`MotionLoopHandle::spawn`] and the only place one ends is
//! [`MotionLoopHandle::stop`] (also run on drop), so at most one loop exists.
//!
//! # The motion loop
//!
//! A dedicated `keypointer-motion` thread runs one tick per period:
//!
//! 1. Check the cancel flag; exit if set.
//! 2. Snapshot the held directions and speed modifiers.
//! 3. For each held direction (Up, Left, Down, Right): read the cursor, add the
//!    move, round, write the cursor back.  A failed read or write skips that move
//!    and the session carries on; the next tick is the retry.
//! 4. Sleep for the tick period on a stop channel, waking early if the handle
//!    is stopped.
//!
//! Stopping is synchronous: [`MotionLoopHandle::stop`] returns only after the
//! thread has been joined, so no move can land after the driver reports Idle.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use keypointer_core::motion::{apply_move, SubpixelCarry};
use keypointer_core::{Action, ActionObserver, HeldActionState, HeldSnapshot, MotionParams};
use tracing::{debug, error, trace, warn};

use super::{PointerBackend, PointerError};

/// Live-loop accounting shared between the driver and its loop threads.
#[derive(Debug, Default)]
struct LoopStats {
    live: AtomicUsize,
    peak: AtomicUsize,
    cursor_writes: AtomicU64,
}

impl LoopStats {
    fn enter(self: &Arc<Self>) -> LiveGuard {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        LiveGuard(Arc::clone(self))
    }
}

/// Decrements the live-loop count when the loop thread exits.
struct LiveGuard(Arc<LoopStats>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything a loop thread needs, moved into it at spawn.
struct LoopContext {
    session: u64,
    state: Arc<HeldActionState>,
    backend: Arc<dyn PointerBackend>,
    params: MotionParams,
    stats: Arc<LoopStats>,
}

/// A running motion loop.  Exists exactly as long as one motion session.
pub struct MotionLoopHandle {
    session: u64,
    cancel: Arc<AtomicBool>,
    wake: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<u64>>,
}

impl MotionLoopHandle {
    fn spawn(ctx: LoopContext) -> io::Result<Self> {
        let session = ctx.session;
        let cancel = Arc::new(AtomicBool::new(false));
        let (wake, sleeper) = mpsc::channel::<()>();

        let loop_cancel = Arc::clone(&cancel);
        let thread = thread::Builder::new()
            .name("keypointer-motion".to_string())
            .spawn(move || run_motion_loop(ctx, &loop_cancel, &sleeper))?;

        debug!(session, "motion session started");
        Ok(Self {
            session,
            cancel,
            wake: Some(wake),
            thread: Some(thread),
        })
    }

    /// Cancels the loop and waits for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        // Dropping the sender wakes the sleeping loop immediately.
        self.wake.take();
        if let Some(thread) = self.thread.take() {
            match thread.join() {
                Ok(ticks) => debug!(session = self.session, ticks, "motion session stopped"),
                Err(_) => error!(session = self.session, "motion loop panicked"),
            }
        }
    }
}

impl Drop for MotionLoopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_motion_loop(ctx: LoopContext, cancel: &AtomicBool, sleeper: &mpsc::Receiver<()>) -> u64 {
    let _live = ctx.stats.enter();
    let mut carry = ctx
        .params
        .carry_subpixel_remainder
        .then(SubpixelCarry::default);
    let mut failing = false;
    let mut ticks = 0u64;

    loop {
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        tick(&ctx, &mut carry, &mut failing);
        ticks += 1;

        match sleeper.recv_timeout(ctx.params.tick) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    ticks
}

/// One iteration of the motion loop.
///
/// `failing` remembers whether the previous cursor operation failed, so a
/// persistent failure is reported once at `warn` rather than every tick.
fn tick(ctx: &LoopContext, carry: &mut Option<SubpixelCarry>, failing: &mut bool) {
    let held = HeldSnapshot::capture(&ctx.state);

    for mv in ctx.params.planned_moves(held) {
        let pos = match ctx.backend.cursor_position() {
            Ok(pos) => pos,
            Err(e) => {
                report_failure(ctx.session, failing, "cursor read", &e);
                continue;
            }
        };

        let (x, y) = match carry.as_mut() {
            Some(carry) => carry.apply(pos, mv),
            None => apply_move(pos, mv),
        };

        match ctx.backend.set_cursor_position(x, y) {
            Ok(()) => {
                *failing = false;
                ctx.stats.cursor_writes.fetch_add(1, Ordering::Relaxed);
                trace!(session = ctx.session, x, y, "cursor moved");
            }
            Err(e) => report_failure(ctx.session, failing, "cursor write", &e),
        }
    }
}

fn report_failure(session: u64, failing: &mut bool, op: &str, err: &PointerError) {
    if *failing {
        debug!(session, "{op} failed again: {err}");
    } else {
        warn!(session, "{op} failed; continuing with next move: {err}");
        *failing = true;
    }
}

/// Starts and stops the motion loop as directional actions are held and released.
pub struct PointerMotionDriver {
    state: Arc<HeldActionState>,
    backend: Arc<dyn PointerBackend>,
    params: MotionParams,
    active: Mutex<Option<MotionLoopHandle>>,
    sessions: AtomicU64,
    stats: Arc<LoopStats>,
}

impl PointerMotionDriver {
    /// Creates a driver.  It does nothing until subscribed; see [`Self::attach`].
    pub fn new(
        state: Arc<HeldActionState>,
        backend: Arc<dyn PointerBackend>,
        params: MotionParams,
    ) -> Self {
        Self {
            state,
            backend,
            params,
            active: Mutex::new(None),
            sessions: AtomicU64::new(0),
            stats: Arc::new(LoopStats::default()),
        }
    }

    /// Creates a driver and subscribes it to the directions and speed modifiers.
    pub fn attach(
        state: &Arc<HeldActionState>,
        backend: Arc<dyn PointerBackend>,
        params: MotionParams,
    ) -> Arc<Self> {
        let driver = Arc::new(Self::new(Arc::clone(state), backend, params));
        state.subscribe_all(
            &[
                Action::MoveUp,
                Action::MoveDown,
                Action::MoveLeft,
                Action::MoveRight,
                Action::SpeedUp,
                Action::SpeedDown,
            ],
            Arc::clone(&driver) as Arc<dyn ActionObserver>,
        );
        driver
    }

    fn active(&self) -> MutexGuard<'_, Option<MotionLoopHandle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-evaluates the held directions and moves between Idle and Moving.
    ///
    /// When this returns in the Idle state, the previous loop (if any) has
    /// already been joined.
    pub fn reconcile(&self) {
        let mut active = self.active();
        let wants_motion = self.state.any_held(&Action::DIRECTIONS);

        match (wants_motion, active.is_some()) {
            (true, false) => {
                let session = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
                let ctx = LoopContext {
                    session,
                    state: Arc::clone(&self.state),
                    backend: Arc::clone(&self.backend),
                    params: self.params,
                    stats: Arc::clone(&self.stats),
                };
                match MotionLoopHandle::spawn(ctx) {
                    Ok(handle) => *active = Some(handle),
                    Err(e) => error!(session, "failed to spawn motion loop: {e}"),
                }
            }
            (false, true) => {
                if let Some(handle) = active.take() {
                    handle.stop();
                }
            }
            _ => {}
        }
    }

    /// Forces the Idle state regardless of held actions.  Used on shutdown.
    pub fn stop(&self) {
        if let Some(handle) = self.active().take() {
            handle.stop();
        }
    }

    /// `true` while a motion loop is running.
    pub fn is_moving(&self) -> bool {
        self.active().is_some()
    }

    /// Number of motion sessions started so far.
    pub fn sessions_started(&self) -> u64 {
        self.sessions.load(Ordering::SeqCst)
    }

    /// Number of loop threads currently executing.
    pub fn live_loops(&self) -> usize {
        self.stats.live.load(Ordering::SeqCst)
    }

    /// Highest number of loop threads ever executing at once.
    pub fn peak_live_loops(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }

    /// Number of successful cursor writes across all sessions.
    pub fn cursor_writes(&self) -> u64 {
        self.stats.cursor_writes.load(Ordering::Relaxed)
    }
}

impl ActionObserver for PointerMotionDriver {
    fn on_action_changed(&self, action: Action, held: bool) {
        if action.is_speed_modifier() {
            // Speed is sampled by the loop each tick; nothing to start or stop.
            trace!(%action, held, "speed modifier changed");
            return;
        }
        self.reconcile();
    }
}
