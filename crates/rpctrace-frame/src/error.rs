/// Errors that can occur while demultiplexing outer frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared payload length exceeds the configured maximum, so the
    /// frame boundaries of this stream can no longer be trusted.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The demultiplexer lost frame synchronization earlier and refuses input.
    #[error("frame stream desynchronized; no further frames can be decoded")]
    Desynchronized,

    /// An I/O error occurred while reading captured bytes.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
