//! Outer frame demultiplexing for captured extension-host IPC streams.
//!
//! Every frame on the wire carries a 13-byte big-endian header:
//! - A 1-byte frame type code
//! - A 4-byte message id
//! - A 4-byte acknowledged id
//! - A 4-byte payload length
//!
//! Only `Regular` frames carry an inner-protocol payload; everything else is
//! an information-only event for the trace.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod demux;
pub mod error;
pub mod frame_type;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use demux::Demultiplexer;
pub use error::{FrameError, Result};
pub use frame_type::FrameType;
