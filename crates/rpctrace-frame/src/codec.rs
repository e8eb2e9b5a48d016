use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::frame_type::FrameType;

/// Frame header: type (1) + id (4) + ack (4) + length (4) = 13 bytes.
pub const HEADER_SIZE: usize = 13;

/// Default maximum payload size: 64 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// One outer frame of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame type code.
    pub frame_type: FrameType,
    /// Sender-assigned message id (zero for most non-Regular frames).
    pub id: u32,
    /// Highest message id acknowledged by the sender.
    pub ack: u32,
    /// The frame payload. Only decoded for [`FrameType::Regular`].
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(frame_type: FrameType, id: u32, ack: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_type,
            id,
            ack,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format (all integers big-endian):
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┬─────────────────┐
/// │ Type     │ Id       │ Ack      │ Length   │ Payload         │
/// │ (1B)     │ (4B BE)  │ (4B BE)  │ (4B BE)  │ (Length bytes)  │
/// └──────────┴──────────┴──────────┴──────────┴─────────────────┘
/// ```
pub fn encode_frame(
    frame_type: FrameType,
    id: u32,
    ack: u32,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(frame_type.code());
    dst.put_u32(id);
    dst.put_u32(ack);
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. Unknown type codes
/// decode to [`FrameType::Unknown`] and are consumed like any other frame.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let mut header = &src[..HEADER_SIZE];
    let frame_type = FrameType::from_code(header.get_u8());
    let id = header.get_u32();
    let ack = header.get_u32();
    let payload_len = header.get_u32() as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame {
        frame_type,
        id,
        ack,
        payload,
    }))
}

/// Configuration for outer frame decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. A larger declared length is treated as
    /// loss of frame synchronization. Default: 64 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
