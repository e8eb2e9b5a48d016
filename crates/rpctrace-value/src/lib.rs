//! Self-describing tagged value codec.
//!
//! The control channel between the main process and an extension host
//! serializes headers and bodies as tagged values: one tag byte, followed by
//! a variable-length size or integer, followed by the content. Objects
//! without a dedicated tag travel as JSON text.

pub mod decode;
pub mod encode;
pub mod error;
pub mod value;

pub use decode::{decode_value, ValueReader, MAX_DEPTH};
pub use encode::{encode_value, write_varint};
pub use error::{Result, ValueError};
pub use value::{buffer_to_json, bytes_to_json, tag, Value};
