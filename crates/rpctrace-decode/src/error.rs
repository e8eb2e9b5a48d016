use rpctrace_frame::FrameError;
use rpctrace_value::ValueError;

/// A local structural fault inside one frame's payload.
///
/// The frame is reported as faulted and skipped; later frames still decode.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A declared length points past the end of the payload.
    #[error("truncated {field}: needed {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// A JSON-carrying field did not parse.
    #[error("invalid json in {field}: {source}")]
    Json {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A mixed-argument tag byte is not one of the known kinds.
    #[error("unknown mixed argument tag {0}")]
    UnknownArgTag(u8),

    /// A tagged control value could not be decoded.
    #[error("value decode failed: {0}")]
    Value(#[from] ValueError),
}

/// Errors surfaced by a connection pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Outer framing lost synchronization; the connection is abandoned.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Input was pushed after the pipeline halted.
    #[error("pipeline halted after frame desynchronization")]
    Halted,

    /// The event sink failed to accept a line.
    #[error("event sink error: {0}")]
    Sink(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
