use thiserror::Error;

/// All errors produced by vizstream-core.
#[derive(Debug, Error)]
pub enum VizstreamError {
    #[error("a replay pass is already running")]
    AlreadyRunning,

    #[error("no replay pass is running")]
    NotRunning,

    #[error("player is not paused")]
    NotPaused,

    #[error("no events loaded")]
    NoEvents,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VizstreamError>;
