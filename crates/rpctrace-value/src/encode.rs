use bytes::{BufMut, BytesMut};

use crate::value::Value;

/// Write a 7-bit variable-length unsigned integer, low group first.
pub fn write_varint(mut value: u32, dst: &mut BytesMut) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            dst.put_u8(byte);
            return;
        }
        dst.put_u8(byte | 0x80);
    }
}

/// Encode a value in the tagged wire format.
///
/// Used to build captures for tests and tooling; the decoder never writes
/// to a live connection.
pub fn encode_value(value: &Value, dst: &mut BytesMut) {
    dst.put_u8(value.tag());
    match value {
        Value::Undefined => {}
        Value::String(s) => put_sized(s.as_bytes(), dst),
        Value::Raw(bytes) | Value::Buffer(bytes) => put_sized(bytes, dst),
        Value::Array(items) => {
            write_varint(items.len() as u32, dst);
            for item in items {
                encode_value(item, dst);
            }
        }
        Value::Object(json) => put_sized(json.to_string().as_bytes(), dst),
        Value::Int(n) => write_varint(*n, dst),
    }
}

fn put_sized(bytes: &[u8], dst: &mut BytesMut) {
    write_varint(bytes.len() as u32, dst);
    dst.put_slice(bytes);
}
