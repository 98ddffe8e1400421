use thiserror::Error;

/// Failures at the output device boundary.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("no default output device")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to play output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("output worker thread failed: {0}")]
    Thread(String),

    #[error("sink is not open")]
    NotOpen,

    #[error("write failed: {0}")]
    Write(String),
}

/// Engine-level failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The output sink could not be opened; the engine stays idle and a
    /// later `start()` may succeed.
    #[error("output sink initialization failed: {0}")]
    Initialization(#[from] SinkError),

    /// A single cue failed to render. Recovered locally: the cue is
    /// dropped and the tick loop keeps running.
    #[error("cue synthesis failed: {0}")]
    Synthesis(String),
}
