//! Chart renderer abstraction.
//!
//! The `ChartRenderer` trait decouples the player from any concrete
//! charting backend (a webview embed, a terminal sparkline, a test double).
//! Render failures use their own error type so hosts can report them
//! distinctly from extraction or playback failures — a spec the extractor
//! accepted can still be unrenderable, and that must never crash the host
//! or show up as a playback error.

use serde_json::Value;
use thiserror::Error;

/// A chart backend failed to draw an otherwise well-formed spec.
#[derive(Debug, Clone, Error)]
#[error("chart render failed: {message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Contract for chart rendering backends.
pub trait ChartRenderer: Send + 'static {
    /// Render `spec`, or show a neutral empty state on `None`.
    ///
    /// # Errors
    /// Returns a `RenderError` when the backend rejects the spec. Callers
    /// display the message and keep running.
    fn render(&mut self, spec: Option<&Value>) -> std::result::Result<(), RenderError>;
}

/// No-op renderer for headless hosts and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl ChartRenderer for NullRenderer {
    fn render(&mut self, _spec: Option<&Value>) -> std::result::Result<(), RenderError> {
        Ok(())
    }
}
