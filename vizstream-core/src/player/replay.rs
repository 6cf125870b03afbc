//! Replay pass loop.
//!
//! ## Per-event processing
//!
//! ```text
//! 1. Loop top: stop requested? → exit to Idle
//! 2. Pause requested? → park in a bounded poll loop (re-check stop on wake)
//! 3. Draw base delay from the pacer, scale by speed, sleep
//! 4. Re-check stop (the request may have landed mid-sleep)
//! 5. Dispatch:
//!    Token → append delta, advance cursor, re-extract, broadcast
//!    Error → record message, Errored, terminate
//!    Done  → Done, terminate
//! ```
//!
//! The loop runs as a plain tokio task; every wait point is a cooperative
//! `tokio::time::sleep`, so control requests are observed within one poll
//! interval in the worst case and no event is ever processed after a stop
//! request is seen.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dump::StreamEvent,
    events::{ChartEvent, ChartState, ChartUpdate, OutputEvent, PlayerStatus, PlayerStatusEvent},
    extract::{extract_last_spec, ExtractionResult},
    inject::inline_data,
    player::{pacing, session::Session, PacerHandle, PlayerConfig},
};

/// All context one replay pass needs, passed as one struct so the spawned
/// task stays tidy.
pub(super) struct ReplayContext {
    pub config: PlayerConfig,
    pub events: Arc<Vec<StreamEvent>>,
    /// First index to process. 0 for a fresh pass, cursor + 1 on resume.
    pub start: usize,
    pub pacer: PacerHandle,
    /// `true` while this pass owns the cursor.
    pub running: Arc<AtomicBool>,
    /// Request flags — the only state written by control calls while the
    /// pass runs.
    pub stop_requested: Arc<AtomicBool>,
    pub pause_requested: Arc<AtomicBool>,
    pub status: Arc<Mutex<PlayerStatus>>,
    pub session: Arc<Mutex<Session>>,
    pub speed: Arc<Mutex<f64>>,
    pub status_tx: broadcast::Sender<PlayerStatusEvent>,
    pub output_tx: broadcast::Sender<OutputEvent>,
    pub chart_tx: broadcast::Sender<ChartEvent>,
    pub seq: Arc<AtomicU64>,
}

/// Run one replay pass until a terminal event, exhaustion, or cancellation.
pub(super) async fn run(ctx: ReplayContext) {
    info!(start = ctx.start, total = ctx.events.len(), "replay pass started");

    for index in ctx.start..ctx.events.len() {
        // Checkpoint 1: cancellation beats everything, including pause.
        if ctx.stop_requested.load(Ordering::SeqCst) {
            return finish(&ctx, PlayerStatus::Idle, None);
        }

        // Checkpoint 2: park while paused. Bounded poll, no busy wait.
        while ctx.pause_requested.load(Ordering::SeqCst)
            && !ctx.stop_requested.load(Ordering::SeqCst)
        {
            sleep(Duration::from_millis(ctx.config.pause_poll_ms)).await;
        }
        if ctx.stop_requested.load(Ordering::SeqCst) {
            return finish(&ctx, PlayerStatus::Idle, None);
        }

        let base = ctx.pacer.0.lock().base_delay_ms();
        let speed = *ctx.speed.lock();
        let delay = pacing::scaled_delay_ms(base, speed, ctx.config.min_delay_ms);
        sleep(Duration::from_millis(delay)).await;

        // Checkpoint 3: a stop request may have landed mid-sleep.
        if ctx.stop_requested.load(Ordering::SeqCst) {
            return finish(&ctx, PlayerStatus::Idle, None);
        }

        match &ctx.events[index] {
            StreamEvent::Token { delta } => process_token(&ctx, index, delta),
            StreamEvent::Error { message } => {
                {
                    let mut session = ctx.session.lock();
                    session.cursor = Some(index);
                    session.error = Some(message.clone());
                }
                warn!(index, message = %message, "stream error event — pass terminated");
                return finish(&ctx, PlayerStatus::Errored, Some(message.clone()));
            }
            StreamEvent::Done(_) => {
                ctx.session.lock().cursor = Some(index);
                debug!(index, "stream done event");
                return finish(&ctx, PlayerStatus::Done, None);
            }
        }
    }

    // Events exhausted without a terminal marker. A pause that landed
    // during the final delay parks the pass here, still resumable.
    while ctx.pause_requested.load(Ordering::SeqCst) && !ctx.stop_requested.load(Ordering::SeqCst) {
        sleep(Duration::from_millis(ctx.config.pause_poll_ms)).await;
    }
    if ctx.stop_requested.load(Ordering::SeqCst) {
        finish(&ctx, PlayerStatus::Idle, None);
    } else {
        finish(&ctx, PlayerStatus::Done, None);
    }
}

/// Append one token, re-run extraction, broadcast the updates.
fn process_token(ctx: &ReplayContext, index: usize, delta: &str) {
    let (text, update) = {
        let mut session = ctx.session.lock();
        // A load_events() racing this append has already requested
        // cancellation; never write into the freshly reset session.
        if ctx.stop_requested.load(Ordering::SeqCst) {
            return;
        }

        session.text.push_str(delta);
        session.cursor = Some(index);

        let update = match extract_last_spec(&session.text) {
            ExtractionResult::Found { spec, raw, source } => {
                let spec = match &ctx.config.inline_dataset {
                    Some(values) => inline_data(&spec, values.clone()),
                    None => spec,
                };
                session.chart = Some(ChartState {
                    spec: spec.clone(),
                    raw: raw.clone(),
                    source,
                });
                session.hint = None;
                Some(ChartUpdate::Spec { spec, raw, source })
            }
            ExtractionResult::InvalidSchema { detail } => {
                session.hint = Some(detail.clone());
                Some(ChartUpdate::Hint { message: detail })
            }
            // Expected mid-write states; the prior chart stays on display.
            ExtractionResult::NotFound | ExtractionResult::InvalidJson { .. } => None,
        };

        (session.text.clone(), update)
    };

    debug!(index, delta_len = delta.len(), acc_len = text.len(), "token processed");

    let seq = ctx.seq.fetch_add(1, Ordering::Relaxed);
    let _ = ctx.output_tx.send(OutputEvent {
        seq,
        cursor: index,
        text,
    });

    if let Some(update) = update {
        let seq = ctx.seq.fetch_add(1, Ordering::Relaxed);
        let _ = ctx.chart_tx.send(ChartEvent { seq, update });
    }
}

/// Publish the terminal status and release the running guard.
fn finish(ctx: &ReplayContext, status: PlayerStatus, detail: Option<String>) {
    {
        let mut current = ctx.status.lock();
        *current = status;
    }
    let _ = ctx.status_tx.send(PlayerStatusEvent { status, detail });
    ctx.running.store(false, Ordering::SeqCst);
    info!(status = ?status, "replay pass ended");
}
