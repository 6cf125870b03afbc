//! Event types emitted to player subscribers.
//!
//! ## Channels
//!
//! | Event | Subscription |
//! |-------|--------------|
//! | `PlayerStatusEvent` | `Player::subscribe_status` |
//! | `OutputEvent` | `Player::subscribe_output` |
//! | `ChartEvent` | `Player::subscribe_chart` |
//!
//! Payloads serialize with camelCase fields so webview hosts can forward
//! them over IPC unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extract::SpecSource;

/// Current state of the player. Written only by the player; everything else
/// reads snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// No pass running; nothing accumulated (or a stopped pass was reset).
    Idle,
    /// A replay pass is actively advancing the cursor.
    Streaming,
    /// A pause was requested; the pass is parked (or about to park).
    Paused,
    /// The pass consumed a `Done` event or ran out of events.
    Done,
    /// The pass consumed an `Error` event or died unexpectedly.
    Errored,
}

/// Emitted whenever the player's status changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatusEvent {
    pub status: PlayerStatus,
    /// Optional human-readable detail (e.g. the stream error message).
    pub detail: Option<String>,
}

/// Emitted after every processed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Index of the token just processed.
    pub cursor: usize,
    /// Full accumulator snapshot after the append.
    pub text: String,
}

/// Emitted when extraction changes the visible chart state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    pub update: ChartUpdate,
}

/// What changed: a fresh renderable spec, or an advisory schema hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartUpdate {
    /// A validated spec (dataset already injected when configured).
    Spec {
        spec: Value,
        /// Exact raw text the spec was parsed from.
        raw: String,
        source: SpecSource,
    },
    /// The latest candidate parsed but is not a renderable spec. The
    /// previously found spec stays on display.
    Hint { message: String },
}

/// Last validated chart spec and where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartState {
    pub spec: Value,
    pub raw: String,
    pub source: SpecSource,
}

/// Read-only view of one playback session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: PlayerStatus,
    /// Current speed factor in [0.25, 4.0].
    pub speed: f64,
    /// Index of the last processed event; `None` before any processing.
    pub cursor: Option<usize>,
    /// Accumulated output text.
    pub text: String,
    /// Last validated chart spec, if any.
    pub chart: Option<ChartState>,
    /// Advisory schema hint, if the latest candidate failed validation.
    pub hint: Option<String>,
    /// Stream error message, once `Errored`.
    pub error: Option<String>,
}
