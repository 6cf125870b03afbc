//! Replay pacing abstraction.
//!
//! The `Pacer` trait is the testability seam for randomized timing: the
//! default `RandomPacer` draws uniform base delays, while tests script a
//! `FixedPacer` and run the whole state machine without real-time jitter.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;

/// Speed values below this floor would blow the division up.
pub const MIN_SPEED_DIVISOR: f64 = 0.1;

/// Source of base (unscaled) per-event delays.
pub trait Pacer: Send + 'static {
    /// Draw the next base delay in milliseconds.
    fn base_delay_ms(&mut self) -> u64;
}

/// Thread-safe reference-counted handle to any `Pacer` implementor.
///
/// `&mut self` on `base_delay_ms` expresses that pacers may be stateful
/// (RNG state, scripted sequences); mutation is serialised through the
/// `parking_lot::Mutex`.
#[derive(Clone)]
pub struct PacerHandle(pub Arc<Mutex<dyn Pacer>>);

impl PacerHandle {
    /// Wrap any `Pacer` in a `PacerHandle`.
    pub fn new<P: Pacer>(pacer: P) -> Self {
        Self(Arc::new(Mutex::new(pacer)))
    }
}

impl std::fmt::Debug for PacerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacerHandle").finish_non_exhaustive()
    }
}

/// Uniform random base delay in `[min_ms, max_ms]`.
#[derive(Debug, Clone)]
pub struct RandomPacer {
    min_ms: u64,
    max_ms: u64,
}

impl RandomPacer {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

impl Default for RandomPacer {
    fn default() -> Self {
        Self::new(50, 150)
    }
}

impl Pacer for RandomPacer {
    fn base_delay_ms(&mut self) -> u64 {
        rand::thread_rng().gen_range(self.min_ms..=self.max_ms)
    }
}

/// Constant base delay — deterministic replays and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedPacer(pub u64);

impl Pacer for FixedPacer {
    fn base_delay_ms(&mut self) -> u64 {
        self.0
    }
}

/// Scale a base delay by the speed factor.
///
/// The divisor is floor-clamped to [`MIN_SPEED_DIVISOR`], the quotient
/// rounded to the nearest millisecond, and the result floor-clamped to
/// `min_delay_ms` so even a 4x replay still yields between events.
pub fn scaled_delay_ms(base_ms: u64, speed: f64, min_delay_ms: u64) -> u64 {
    let scaled = (base_ms as f64 / speed.max(MIN_SPEED_DIVISOR)).round() as u64;
    scaled.max(min_delay_ms)
}
