//! Compact binary call/reply protocol between the main process and an
//! extension host.
//!
//! Every message starts with a 1-byte type and a 4-byte big-endian request
//! id. The remaining layout depends on the type; see [`decode_message`].

pub mod message;
pub mod message_type;
pub mod reader;

pub use message::{
    decode_message, Arguments, JsonWithBuffers, MixedArg, RemoteError, ReplyValue, RequestArgs,
    RpcBody, RpcFrame, RpcMessage, BUFFER_REF_KEY,
};
pub use message_type::MessageType;
pub use reader::MessageReader;
