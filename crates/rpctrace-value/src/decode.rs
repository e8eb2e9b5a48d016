use bytes::{Buf, Bytes};

use crate::error::{Result, ValueError};
use crate::value::{tag, Value};

/// Maximum array nesting accepted before decoding gives up.
pub const MAX_DEPTH: usize = 64;

/// Sequentially decodes tagged values from one payload.
#[derive(Debug, Clone)]
pub struct ValueReader {
    buf: Bytes,
}

impl ValueReader {
    /// Create a reader positioned at the start of `payload`.
    pub fn new(payload: Bytes) -> Self {
        Self { buf: payload }
    }

    /// Decode the next value.
    pub fn read_value(&mut self) -> Result<Value> {
        self.read_nested(0)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// The unconsumed tail of the payload.
    pub fn into_remainder(self) -> Bytes {
        self.buf
    }

    fn read_nested(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(ValueError::TooDeep(MAX_DEPTH));
        }

        self.ensure(1)?;
        match self.buf.get_u8() {
            tag::UNDEFINED => Ok(Value::Undefined),
            tag::STRING => {
                let bytes = self.read_sized()?;
                Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            }
            tag::RAW => Ok(Value::Raw(self.read_sized()?)),
            tag::BUFFER => Ok(Value::Buffer(self.read_sized()?)),
            tag::ARRAY => {
                let len = self.read_varint()? as usize;
                // Every element takes at least one byte.
                let mut items = Vec::with_capacity(len.min(self.buf.remaining()));
                for _ in 0..len {
                    items.push(self.read_nested(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            tag::OBJECT => {
                let bytes = self.read_sized()?;
                Ok(Value::Object(serde_json::from_slice(&bytes)?))
            }
            tag::INT => Ok(Value::Int(self.read_varint()?)),
            other => Err(ValueError::UnknownTag(other)),
        }
    }

    /// Read a 7-bit variable-length unsigned integer, low group first.
    pub fn read_varint(&mut self) -> Result<u32> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            self.ensure(1)?;
            let byte = self.buf.get_u8();
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return u32::try_from(value).map_err(|_| ValueError::VarintOverflow);
            }
            shift += 7;
            if shift > 28 {
                return Err(ValueError::VarintOverflow);
            }
        }
    }

    fn read_sized(&mut self) -> Result<Bytes> {
        let len = self.read_varint()? as usize;
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.buf.remaining();
        if available < needed {
            return Err(ValueError::UnexpectedEof { needed, available });
        }
        Ok(())
    }
}

/// Decode a single value from the front of `payload`.
pub fn decode_value(payload: Bytes) -> Result<Value> {
    ValueReader::new(payload).read_value()
}
