//! Passive decoding of captured extension-host IPC connections.
//!
//! Each captured direction of a connection runs through its own
//! [`Pipeline`]:
//! - outer frames are reassembled from arbitrary chunks
//! - the first `Regular` frame decides the inner protocol (control or
//!   binary RPC) once and for all
//! - every frame becomes exactly one [`LogLine`] handed to an [`EventSink`]
//!
//! A malformed frame is reported as a fault and skipped. A frame length
//! that cannot be trusted ends the connection with a single desync line.

pub mod classify;
pub mod config;
pub mod control;
pub mod error;
pub mod render;
pub mod report;
pub mod rpc;
pub mod session;
pub mod stats;

pub use classify::{classify, StreamKind};
pub use config::{DecodeConfig, RenderConfig, DEFAULT_MAX_DETAIL_CHARS};
pub use control::{decode_control, ControlMessage, ControlOp};
pub use error::{DecodeError, PipelineError, Result};
pub use render::{truncate_chars, Renderer};
pub use report::{Direction, Event, EventSink, LogLine, Reporter, SessionTag};
pub use rpc::{decode_message, MessageType, RpcFrame, RpcMessage};
pub use session::{Pipeline, Summary};
pub use stats::{Tally, TallyCategory, TallyRow};
