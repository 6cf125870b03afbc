//! # vizstream-core
//!
//! Reusable chart-spec replay engine SDK.
//!
//! Replays recorded AI-stream dumps token by token and live-extracts the
//! most recent well-formed chart specification from the growing output.
//!
//! ## Architecture
//!
//! ```text
//! dump text → parse_dump → Vec<StreamEvent> → Player (tokio task)
//!                                                  │
//!                                        accumulate Token.delta
//!                                                  │
//!                                        extract_last_spec (pure)
//!                                                  │
//!                                 broadcast::Sender<Output/Chart/Status>
//! ```
//!
//! The replay pass is fully cooperative: pause/stop requests are observed
//! at fixed checkpoints, and pause/resume is observationally transparent to
//! the final accumulated output.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod dump;
pub mod error;
pub mod events;
pub mod extract;
pub mod inject;
pub mod player;
pub mod render;

// Convenience re-exports for downstream crates
pub use dump::{parse_dump, parse_dump_file, StreamEvent};
pub use error::VizstreamError;
pub use events::{
    ChartEvent, ChartState, ChartUpdate, OutputEvent, PlayerStatus, PlayerStatusEvent,
    SessionSnapshot,
};
pub use extract::{extract_last_spec, ExtractionResult, SpecSource};
pub use inject::inline_data;
pub use player::{FixedPacer, Pacer, PacerHandle, Player, PlayerConfig, RandomPacer};
pub use render::{ChartRenderer, NullRenderer, RenderError};
