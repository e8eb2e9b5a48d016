use bytes::Bytes;
use rpctrace_value::buffer_to_json;
use serde::Serialize;
use serde_json::{Map, Value as Json};
use tracing::debug;

use super::message_type::MessageType;
use super::reader::MessageReader;
use crate::error::{DecodeError, Result};

/// Key marking a buffer reference inside JSON-with-buffers payloads.
pub const BUFFER_REF_KEY: &str = "$$ref$$";

/// Tag bytes preceding each argument of a mixed-argument request.
pub mod arg_tag {
    pub const JSON: u8 = 1;
    pub const BUFFER: u8 = 2;
    pub const JSON_WITH_BUFFERS: u8 = 3;
    pub const UNDEFINED: u8 = 4;
}

/// JSON whose `{"$$ref$$": i}` objects point into a list of buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonWithBuffers {
    pub json: Json,
    pub buffers: Vec<Bytes>,
}

impl JsonWithBuffers {
    /// The JSON with every reference replaced by its buffer. References
    /// to missing buffers are dropped from objects and become `null` in
    /// arrays.
    pub fn resolve(&self) -> Option<Json> {
        restore_refs(&self.json, &self.buffers)
    }

    /// Rendered as a wrapper object `{"value": ...}`.
    pub fn to_json(&self) -> Json {
        let mut map = Map::with_capacity(1);
        if let Some(value) = self.resolve() {
            map.insert("value".to_string(), value);
        }
        Json::Object(map)
    }
}

fn restore_refs(value: &Json, buffers: &[Bytes]) -> Option<Json> {
    match value {
        Json::Object(map) => {
            if let Some(reference) = map.get(BUFFER_REF_KEY).filter(|r| r.is_number()) {
                return reference
                    .as_u64()
                    .and_then(|index| usize::try_from(index).ok())
                    .and_then(|index| buffers.get(index))
                    .map(|buffer| buffer_to_json(buffer));
            }
            let restored = map
                .iter()
                .filter_map(|(key, v)| restore_refs(v, buffers).map(|v| (key.clone(), v)))
                .collect();
            Some(Json::Object(restored))
        }
        Json::Array(items) => Some(Json::Array(
            items
                .iter()
                .map(|item| restore_refs(item, buffers).unwrap_or(Json::Null))
                .collect(),
        )),
        other => Some(other.clone()),
    }
}

/// One argument of a mixed-argument request.
#[derive(Debug, Clone, PartialEq)]
pub enum MixedArg {
    Json(Json),
    Buffer(Bytes),
    JsonWithBuffers(JsonWithBuffers),
    Undefined,
}

impl MixedArg {
    pub fn to_json(&self) -> Json {
        match self {
            Self::Json(json) => json.clone(),
            Self::Buffer(bytes) => buffer_to_json(bytes),
            Self::JsonWithBuffers(value) => value.to_json(),
            Self::Undefined => Json::Null,
        }
    }
}

/// Request arguments, either one JSON array or a tagged sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    Json(Json),
    Mixed(Vec<MixedArg>),
}

impl Arguments {
    pub fn to_json(&self) -> Json {
        match self {
            Self::Json(json) => json.clone(),
            Self::Mixed(args) => Json::Array(args.iter().map(MixedArg::to_json).collect()),
        }
    }
}

/// A call on a remote proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestArgs {
    /// Identifier of the registered proxy being called.
    pub target_id: u8,
    pub method: String,
    pub args: Arguments,
}

/// Error object carried by an error reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteError {
    pub message: Option<String>,
    pub name: Option<String>,
    pub stack: Option<String>,
    /// The full decoded object, rendered as-is.
    pub raw: Json,
}

impl RemoteError {
    pub fn from_json(raw: Json) -> Self {
        let field = |key: &str| raw.get(key).and_then(Json::as_str).map(str::to_string);
        Self {
            message: field("message"),
            name: field("name"),
            stack: field("stack"),
            raw,
        }
    }
}

/// Body of a reply message.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyValue {
    Empty,
    Json(Json),
    JsonWithBuffers(JsonWithBuffers),
    RawBuffer(Bytes),
    Error(RemoteError),
}

impl ReplyValue {
    pub fn to_json(&self) -> Option<Json> {
        match self {
            Self::Empty => None,
            Self::Json(json) => Some(json.clone()),
            Self::JsonWithBuffers(value) => Some(value.to_json()),
            Self::RawBuffer(bytes) => Some(buffer_to_json(bytes)),
            Self::Error(err) => Some(err.raw.clone()),
        }
    }
}

/// Body following the preamble, by message type.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcBody {
    Request {
        args: RequestArgs,
        cancellable: bool,
    },
    /// Acknowledged and Cancel carry nothing after the preamble.
    Empty,
    Reply(ReplyValue),
}

/// A decoded binary RPC message.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcMessage {
    pub message_type: MessageType,
    pub request_id: u32,
    pub body: RpcBody,
}

impl RpcMessage {
    /// The rendered payload, or `None` for preamble-only messages.
    ///
    /// Requests render as `[target, method, args, cancellable]`.
    pub fn payload_json(&self) -> Option<Json> {
        match &self.body {
            RpcBody::Request { args, cancellable } => Some(Json::Array(vec![
                Json::from(args.target_id),
                Json::String(args.method.clone()),
                args.args.to_json(),
                Json::Bool(*cancellable),
            ])),
            RpcBody::Empty => None,
            RpcBody::Reply(reply) => reply.to_json(),
        }
    }

    /// Method name for requests.
    pub fn method(&self) -> Option<&str> {
        match &self.body {
            RpcBody::Request { args, .. } => Some(&args.method),
            _ => None,
        }
    }
}

/// Outcome of decoding one binary RPC frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcFrame {
    Message(RpcMessage),
    /// Unknown message type; the whole payload is kept for display.
    Unexpected { code: u8, raw: Bytes },
}

/// Decode one binary RPC frame payload.
pub fn decode_message(payload: Bytes) -> Result<RpcFrame> {
    let mut reader = MessageReader::new(payload.clone());
    let message_type = MessageType::from_code(reader.read_u8("message type")?);
    let request_id = match message_type {
        MessageType::Unknown(code) => return Ok(RpcFrame::Unexpected { code, raw: payload }),
        _ => reader.read_u32("request id")?,
    };

    let body = match message_type {
        MessageType::RequestJsonArgs | MessageType::RequestJsonArgsWithCancellation => {
            RpcBody::Request {
                args: read_json_request(&mut reader)?,
                cancellable: message_type.is_cancellable(),
            }
        }
        MessageType::RequestMixedArgs | MessageType::RequestMixedArgsWithCancellation => {
            RpcBody::Request {
                args: read_mixed_request(&mut reader)?,
                cancellable: message_type.is_cancellable(),
            }
        }
        // Unknown already returned above.
        MessageType::Acknowledged | MessageType::Cancel | MessageType::Unknown(_) => RpcBody::Empty,
        MessageType::ReplyOkEmpty | MessageType::ReplyErrEmpty => RpcBody::Reply(ReplyValue::Empty),
        MessageType::ReplyOkVsBuffer => {
            RpcBody::Reply(ReplyValue::RawBuffer(reader.read_buffer("reply buffer")?))
        }
        MessageType::ReplyOkJson => RpcBody::Reply(ReplyValue::Json(reader.read_json("reply")?)),
        MessageType::ReplyOkJsonWithBuffers => {
            let buffers = reader.read_buffer_list("reply buffers")?;
            let json = reader.read_json("reply")?;
            RpcBody::Reply(ReplyValue::JsonWithBuffers(JsonWithBuffers { json, buffers }))
        }
        MessageType::ReplyErrError => {
            RpcBody::Reply(ReplyValue::Error(RemoteError::from_json(reader.read_json("error")?)))
        }
    };

    if reader.remaining() > 0 {
        debug!(
            message_type = message_type.label(),
            request_id,
            trailing = reader.remaining(),
            "ignoring trailing bytes"
        );
    }

    Ok(RpcFrame::Message(RpcMessage {
        message_type,
        request_id,
        body,
    }))
}

fn read_json_request(reader: &mut MessageReader) -> Result<RequestArgs> {
    let target_id = reader.read_u8("target id")?;
    let method = reader.read_short_string("method")?;
    let args = reader.read_json("arguments")?;
    Ok(RequestArgs {
        target_id,
        method,
        args: Arguments::Json(args),
    })
}

fn read_mixed_request(reader: &mut MessageReader) -> Result<RequestArgs> {
    let target_id = reader.read_u8("target id")?;
    let method = reader.read_short_string("method")?;
    let count = reader.read_u8("argument count")?;

    let mut args = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let arg = match reader.read_u8("argument tag")? {
            arg_tag::JSON => MixedArg::Json(reader.read_json("argument")?),
            arg_tag::BUFFER => MixedArg::Buffer(reader.read_buffer("argument buffer")?),
            arg_tag::JSON_WITH_BUFFERS => {
                let buffers = reader.read_buffer_list("argument buffers")?;
                let json = reader.read_json("argument")?;
                MixedArg::JsonWithBuffers(JsonWithBuffers { json, buffers })
            }
            arg_tag::UNDEFINED => MixedArg::Undefined,
            other => return Err(DecodeError::UnknownArgTag(other)),
        };
        args.push(arg);
    }

    Ok(RequestArgs {
        target_id,
        method,
        args: Arguments::Mixed(args),
    })
}
