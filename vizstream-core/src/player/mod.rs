//! `Player` — top-level playback lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! Player::new()
//!     └─► load_events()      → sequence replaced, status = Idle
//!         └─► play()         → pass spawned from index 0, status = Streaming
//!             ├─► pause()    → pass parks at next checkpoint, status = Paused
//!             │       └─► resume() → pass continues after the cursor
//!             └─► stop()     → pass exits at next checkpoint, status = Idle
//! ```
//!
//! Control calls in the wrong state return an error rather than panicking.
//!
//! ## Threading
//!
//! `Player` is `Send + Sync` — all fields use interior mutability. Wrap in
//! `Arc<Player>` to share between a host UI and event-forwarding tasks. One
//! replay pass at a time owns the cursor; `pause`/`stop` communicate with it
//! exclusively through the two request flags.

pub mod pacing;
mod replay;
mod session;

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::{
    dump::StreamEvent,
    error::{Result, VizstreamError},
    events::{ChartEvent, OutputEvent, PlayerStatus, PlayerStatusEvent, SessionSnapshot},
};

pub use pacing::{FixedPacer, Pacer, PacerHandle, RandomPacer};

use session::Session;

/// Broadcast channel capacity: 256 events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

/// User-settable speed factor bounds.
pub const SPEED_MIN: f64 = 0.25;
pub const SPEED_MAX: f64 = 4.0;

/// Configuration for `Player`.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Poll interval while a pass is parked on pause (ms). Default: 60.
    pub pause_poll_ms: u64,
    /// Floor for the scaled per-event delay (ms). Default: 5.
    pub min_delay_ms: u64,
    /// Initial speed factor, clamped to [`SPEED_MIN`, `SPEED_MAX`].
    /// Default: 1.0.
    pub initial_speed: f64,
    /// Dataset injected inline into every validated spec before it reaches
    /// chart state. `None` leaves extracted specs untouched.
    pub inline_dataset: Option<Value>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            pause_poll_ms: 60,
            min_delay_ms: 5,
            initial_speed: 1.0,
            inline_dataset: None,
        }
    }
}

/// The top-level playback handle.
pub struct Player {
    config: PlayerConfig,
    pacer: PacerHandle,
    /// Loaded event sequence; immutable once decoded, swapped wholesale.
    events: Mutex<Arc<Vec<StreamEvent>>>,
    /// `true` while a replay pass owns the cursor.
    running: Arc<AtomicBool>,
    /// Request flags — the only cross-task channel into a running pass.
    stop_requested: Arc<AtomicBool>,
    pause_requested: Arc<AtomicBool>,
    /// Canonical status (written by the controller and the pass only).
    status: Arc<Mutex<PlayerStatus>>,
    session: Arc<Mutex<Session>>,
    /// Speed factor in [`SPEED_MIN`, `SPEED_MAX`].
    speed: Arc<Mutex<f64>>,
    status_tx: broadcast::Sender<PlayerStatusEvent>,
    output_tx: broadcast::Sender<OutputEvent>,
    chart_tx: broadcast::Sender<ChartEvent>,
    /// Monotonically increasing event sequence counter.
    seq: Arc<AtomicU64>,
}

impl Player {
    /// Create a player with the default randomized pacer.
    pub fn new(config: PlayerConfig) -> Self {
        Self::with_pacer(config, PacerHandle::new(RandomPacer::default()))
    }

    /// Create a player with an explicit pacer (deterministic replays, tests).
    pub fn with_pacer(config: PlayerConfig, pacer: PacerHandle) -> Self {
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (output_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (chart_tx, _) = broadcast::channel(BROADCAST_CAP);
        let initial_speed = config.initial_speed.clamp(SPEED_MIN, SPEED_MAX);

        Self {
            config,
            pacer,
            events: Mutex::new(Arc::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            pause_requested: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(PlayerStatus::Idle)),
            session: Arc::new(Mutex::new(Session::default())),
            speed: Arc::new(Mutex::new(initial_speed)),
            status_tx,
            output_tx,
            chart_tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the event sequence and reset the session to `Idle`.
    ///
    /// A pass that is still running is abandoned: it observes the
    /// cancellation flag at its next checkpoint and exits without
    /// processing further events or touching the fresh session. `play()`
    /// succeeds once the abandoned pass has released its guard.
    pub fn load_events(&self, events: Vec<StreamEvent>) {
        if self.running.load(Ordering::SeqCst) {
            self.stop_requested.store(true, Ordering::SeqCst);
            info!("abandoning in-flight pass for a new event log");
        }

        let count = events.len();
        *self.events.lock() = Arc::new(events);
        self.session.lock().reset();
        self.set_status(PlayerStatus::Idle, None);
        info!(count, "event log loaded");
    }

    /// Start a fresh pass from index 0.
    ///
    /// Full restart semantics: the accumulator, cursor, and extraction
    /// state are cleared even when the previous pass ended in
    /// `Paused`/`Done`/`Errored`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - `VizstreamError::NoEvents` if no sequence is loaded.
    /// - `VizstreamError::AlreadyRunning` if a pass is active.
    pub fn play(&self) -> Result<()> {
        let events = Arc::clone(&*self.events.lock());
        if events.is_empty() {
            return Err(VizstreamError::NoEvents);
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(VizstreamError::AlreadyRunning);
        }

        self.stop_requested.store(false, Ordering::SeqCst);
        self.pause_requested.store(false, Ordering::SeqCst);
        self.session.lock().reset();
        self.set_status(PlayerStatus::Streaming, None);
        info!(total = events.len(), "playback started");

        self.spawn_pass(events, 0);
        Ok(())
    }

    /// Request the running pass to suspend before processing its next event.
    ///
    /// The visible status flips to `Paused` immediately; the pass parks at
    /// its next checkpoint in a bounded poll loop.
    ///
    /// # Errors
    /// `VizstreamError::NotRunning` without an active pass.
    pub fn pause(&self) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(VizstreamError::NotRunning);
        }
        self.pause_requested.store(true, Ordering::SeqCst);
        self.set_status(PlayerStatus::Paused, None);
        info!("pause requested");
        Ok(())
    }

    /// Continue a paused pass from the exact interruption point.
    ///
    /// The accumulator and extraction state are preserved; the parked pass
    /// picks up with the event after the cursor within one poll interval.
    /// Never re-derives the accumulator.
    ///
    /// # Errors
    /// `VizstreamError::NotPaused` unless the player is currently paused.
    pub fn resume(&self) -> Result<()> {
        if *self.status.lock() != PlayerStatus::Paused {
            return Err(VizstreamError::NotPaused);
        }
        self.pause_requested.store(false, Ordering::SeqCst);
        self.set_status(PlayerStatus::Streaming, None);
        info!(cursor = ?self.session.lock().cursor, "resumed from pause point");
        Ok(())
    }

    /// Request cancellation of the running pass.
    ///
    /// The pass exits at its next checkpoint without processing another
    /// event and settles in `Idle`. Takes priority over a pending pause.
    ///
    /// # Errors
    /// `VizstreamError::NotRunning` without an active pass.
    pub fn stop(&self) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(VizstreamError::NotRunning);
        }
        self.stop_requested.store(true, Ordering::SeqCst);
        info!("stop requested");
        Ok(())
    }

    /// Set the speed factor, clamped to [`SPEED_MIN`, `SPEED_MAX`].
    ///
    /// Affects only delay computation — never accumulation or extraction.
    /// Non-finite input is ignored. Returns the effective speed.
    pub fn set_speed(&self, speed: f64) -> f64 {
        let mut current = self.speed.lock();
        if speed.is_finite() {
            *current = speed.clamp(SPEED_MIN, SPEED_MAX);
            debug!(speed = *current, "speed changed");
        }
        *current
    }

    /// Current speed factor.
    pub fn speed(&self) -> f64 {
        *self.speed.lock()
    }

    /// Current status (snapshot).
    pub fn status(&self) -> PlayerStatus {
        *self.status.lock()
    }

    /// Read-only snapshot of the whole session.
    pub fn snapshot(&self) -> SessionSnapshot {
        let status = *self.status.lock();
        let speed = *self.speed.lock();
        self.session.lock().snapshot(status, speed)
    }

    /// Number of loaded events.
    pub fn events_len(&self) -> usize {
        self.events.lock().len()
    }

    /// True when `play()` would start a pass.
    pub fn can_play(&self) -> bool {
        let status = *self.status.lock();
        self.events_len() > 0
            && matches!(
                status,
                PlayerStatus::Idle | PlayerStatus::Done | PlayerStatus::Errored
            )
    }

    /// True when `pause()` would take effect.
    pub fn can_pause(&self) -> bool {
        *self.status.lock() == PlayerStatus::Streaming
    }

    /// True when `resume()` would take effect.
    pub fn can_resume(&self) -> bool {
        *self.status.lock() == PlayerStatus::Paused
    }

    /// True when `stop()` would take effect.
    pub fn can_stop(&self) -> bool {
        matches!(
            *self.status.lock(),
            PlayerStatus::Streaming | PlayerStatus::Paused
        )
    }

    /// Subscribe to status change events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<PlayerStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Subscribe to per-token output events.
    pub fn subscribe_output(&self) -> broadcast::Receiver<OutputEvent> {
        self.output_tx.subscribe()
    }

    /// Subscribe to chart state updates.
    pub fn subscribe_chart(&self) -> broadcast::Receiver<ChartEvent> {
        self.chart_tx.subscribe()
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn spawn_pass(&self, events: Arc<Vec<StreamEvent>>, start: usize) {
        let ctx = replay::ReplayContext {
            config: self.config.clone(),
            events,
            start,
            pacer: self.pacer.clone(),
            running: Arc::clone(&self.running),
            stop_requested: Arc::clone(&self.stop_requested),
            pause_requested: Arc::clone(&self.pause_requested),
            status: Arc::clone(&self.status),
            session: Arc::clone(&self.session),
            speed: Arc::clone(&self.speed),
            status_tx: self.status_tx.clone(),
            output_tx: self.output_tx.clone(),
            chart_tx: self.chart_tx.clone(),
            seq: Arc::clone(&self.seq),
        };

        let running = Arc::clone(&self.running);
        let status = Arc::clone(&self.status);
        let session = Arc::clone(&self.session);
        let status_tx = self.status_tx.clone();

        // The watchdog contains truly unexpected failures: a pass that dies
        // without finishing still lands in a consistent Errored state.
        tokio::spawn(async move {
            let pass = tokio::spawn(replay::run(ctx));
            if let Err(e) = pass.await {
                let description = if e.is_panic() {
                    "replay pass panicked".to_string()
                } else {
                    format!("replay pass failed: {e}")
                };
                error!(error = %description, "replay pass died unexpectedly");
                session.lock().error = Some(description.clone());
                *status.lock() = PlayerStatus::Errored;
                let _ = status_tx.send(PlayerStatusEvent {
                    status: PlayerStatus::Errored,
                    detail: Some(description),
                });
                running.store(false, Ordering::SeqCst);
            }
        });
    }

    fn set_status(&self, new_status: PlayerStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(PlayerStatusEvent {
            status: new_status,
            detail,
        });
    }
}
