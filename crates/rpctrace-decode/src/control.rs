//! Control channel decoding: one tagged header followed by one tagged body.

use bytes::Bytes;
use rpctrace_value::{Value, ValueReader};

use crate::error::Result;

/// Operation carried in `header[0]` of a control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlOp {
    Request,
    Cancel,
    Subscribe,
    Unsubscribe,
    Init,
    Reply,
    ReplyErr,
    ReplyErrObj,
    Event,
    /// Unmapped or missing code. Logged, never an error.
    Unknown(Option<u32>),
}

impl ControlOp {
    /// Map `header[0]`, or its absence, to an op.
    pub fn from_code(code: Option<u32>) -> Self {
        match code {
            Some(100) => Self::Request,
            Some(101) => Self::Cancel,
            Some(102) => Self::Subscribe,
            Some(103) => Self::Unsubscribe,
            Some(200) => Self::Init,
            Some(201) => Self::Reply,
            Some(202) => Self::ReplyErr,
            Some(203) => Self::ReplyErrObj,
            Some(204) => Self::Event,
            other => Self::Unknown(other),
        }
    }

    /// Label printed for this op. Log readers match on these exact strings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Request => "req",
            Self::Cancel => "cancel",
            Self::Subscribe => "subscript",
            Self::Unsubscribe => "unsubscribe",
            Self::Init => "init",
            Self::Reply => "reply",
            Self::ReplyErr | Self::ReplyErrObj => "replyErr",
            Self::Event => "event",
            Self::Unknown(_) => "undefined",
        }
    }
}

/// A decoded control message.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMessage {
    pub op: ControlOp,
    pub header: Value,
    pub body: Value,
}

impl ControlMessage {
    /// `channel.name` addressed by a request or subscription header
    /// (`[op, id, channel, name]`).
    pub fn target(&self) -> Option<String> {
        let channel = self.header.get(2)?.as_str()?;
        let name = self.header.get(3)?.as_str()?;
        Some(format!("{channel}.{name}"))
    }
}

/// Decode a control frame payload.
pub fn decode_control(payload: Bytes) -> Result<ControlMessage> {
    let mut reader = ValueReader::new(payload);
    let header = reader.read_value()?;
    let body = reader.read_value()?;
    let op = ControlOp::from_code(header.get(0).and_then(Value::as_int));
    Ok(ControlMessage { op, header, body })
}
