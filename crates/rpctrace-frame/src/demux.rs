use bytes::BytesMut;
use tracing::{debug, error};

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Reassembles outer frames from incrementally delivered byte chunks.
///
/// One demultiplexer belongs to exactly one captured connection. Chunk
/// boundaries may fall anywhere; partial frames are buffered until the next
/// [`push`](Self::push).
#[derive(Debug)]
pub struct Demultiplexer {
    buf: BytesMut,
    config: FrameConfig,
    halted: bool,
}

impl Demultiplexer {
    /// Create a demultiplexer with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a demultiplexer with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            halted: false,
        }
    }

    /// Append a chunk and return every frame it completes, in wire order.
    ///
    /// Returns `Err(FrameError::PayloadTooLarge)` the first time an
    /// untrustworthy length is seen. Frames completed earlier in the same
    /// chunk are lost with that error, and the demultiplexer halts: every
    /// later call fails with `FrameError::Desynchronized`.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        self.push_with(chunk, |frame| frames.push(frame))?;
        Ok(frames)
    }

    /// Like [`push`](Self::push), but hands each frame to `on_frame` as soon
    /// as it is complete, so frames before a desynchronization point are
    /// still delivered.
    pub fn push_with<F>(&mut self, chunk: &[u8], mut on_frame: F) -> Result<()>
    where
        F: FnMut(Frame),
    {
        if self.halted {
            return Err(FrameError::Desynchronized);
        }

        self.buf.extend_from_slice(chunk);

        loop {
            match decode_frame(&mut self.buf, self.config.max_payload_size) {
                Ok(Some(frame)) => {
                    debug!(
                        frame_type = %frame.frame_type,
                        id = frame.id,
                        ack = frame.ack,
                        size = frame.payload.len(),
                        "frame demultiplexed"
                    );
                    on_frame(frame);
                }
                Ok(None) => return Ok(()),
                Err(err) => {
                    error!(error = %err, buffered = self.buf.len(), "frame stream desynchronized");
                    self.halted = true;
                    self.buf.clear();
                    return Err(err);
                }
            }
        }
    }

    /// Number of buffered bytes belonging to an incomplete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Returns true once frame synchronization has been lost.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Current configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Default for Demultiplexer {
    fn default() -> Self {
        Self::new()
    }
}
