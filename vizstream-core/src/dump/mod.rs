//! Recorded-stream dump decoding.
//!
//! A dump is newline-delimited text. Each non-blank line is one JSON record
//! with an `event` discriminator (`token` | `done` | `error`) and a `data`
//! payload whose shape depends on the discriminator:
//!
//! ```text
//! {"event":"token","data":{"delta":"```json\n{\"mark\""}}
//! {"event":"done","data":{}}
//! {"event":"error","data":{"message":"stream aborted"}}
//! ```
//!
//! Lines that fail to parse, or lack either field, are dropped without
//! aborting the rest of the file — recorded dumps routinely contain
//! truncated tails and interleaved log noise.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// One decoded event of a recorded stream.
///
/// Events are immutable once decoded; the player owns the sequence for the
/// duration of one playback session and never reorders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Incremental text fragment appended to the output accumulator.
    Token { delta: String },
    /// Terminal success marker. The payload is carried but never interpreted.
    Done(Value),
    /// Terminal failure marker.
    Error { message: String },
}

/// Decode a dump into an ordered event sequence.
///
/// Malformed lines are skipped silently (logged at `debug!`); the result may
/// be empty. Never blocks, never fails.
pub fn parse_dump(text: &str) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<StreamEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                debug!(lineno = lineno + 1, error = %e, "dropped malformed dump line");
            }
        }
    }

    events
}

/// Read and decode a dump file.
///
/// # Errors
/// IO errors only — malformed lines inside the file are still skipped.
pub fn parse_dump_file(path: impl AsRef<Path>) -> Result<Vec<StreamEvent>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_dump(&text))
}
