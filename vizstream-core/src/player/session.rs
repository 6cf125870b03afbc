//! Mutable per-playback session state.

use crate::events::{ChartState, PlayerStatus, SessionSnapshot};

/// State owned by the active replay pass and mutated only by it.
///
/// The accumulator (`text`) is append-only within a pass: after processing
/// index *i* it equals exactly the concatenation of the token deltas at
/// indices `0..=i` that were processed. `cursor` is the index of the last
/// processed event (`None` before any processing) and is monotonically
/// non-decreasing within a pass.
#[derive(Debug, Default)]
pub(super) struct Session {
    pub text: String,
    pub cursor: Option<usize>,
    pub chart: Option<ChartState>,
    pub hint: Option<String>,
    pub error: Option<String>,
}

impl Session {
    /// Full restart semantics: wipe everything a pass accumulates.
    pub fn reset(&mut self) {
        self.text.clear();
        self.cursor = None;
        self.chart = None;
        self.hint = None;
        self.error = None;
    }

    pub fn snapshot(&self, status: PlayerStatus, speed: f64) -> SessionSnapshot {
        SessionSnapshot {
            status,
            speed,
            cursor: self.cursor,
            text: self.text.clone(),
            chart: self.chart.clone(),
            hint: self.hint.clone(),
            error: self.error.clone(),
        }
    }
}
