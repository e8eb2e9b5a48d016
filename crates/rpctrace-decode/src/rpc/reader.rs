use bytes::{Buf, Bytes};

use crate::error::{DecodeError, Result};

/// Bounds-checked big-endian field reader over one message payload.
///
/// Every read checks the remaining length first, so a lying length prefix
/// becomes [`DecodeError::Truncated`] instead of a panic.
#[derive(Debug, Clone)]
pub struct MessageReader {
    buf: Bytes,
}

impl MessageReader {
    pub fn new(payload: Bytes) -> Self {
        Self { buf: payload }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        self.ensure(field, 1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        self.ensure(field, 4)?;
        Ok(self.buf.get_u32())
    }

    /// u8 length, then UTF-8 bytes.
    pub fn read_short_string(&mut self, field: &'static str) -> Result<String> {
        let len = self.read_u8(field)? as usize;
        self.read_text(field, len)
    }

    /// u32 length, then UTF-8 bytes.
    pub fn read_long_string(&mut self, field: &'static str) -> Result<String> {
        let len = self.read_u32(field)? as usize;
        self.read_text(field, len)
    }

    /// u32 length, then raw bytes.
    pub fn read_buffer(&mut self, field: &'static str) -> Result<Bytes> {
        let len = self.read_u32(field)? as usize;
        self.ensure(field, len)?;
        Ok(self.buf.split_to(len))
    }

    /// A long string holding JSON text.
    pub fn read_json(&mut self, field: &'static str) -> Result<serde_json::Value> {
        let text = self.read_long_string(field)?;
        serde_json::from_str(&text).map_err(|source| DecodeError::Json { field, source })
    }

    /// u32 count, then that many buffers.
    pub fn read_buffer_list(&mut self, field: &'static str) -> Result<Vec<Bytes>> {
        let count = self.read_u32(field)? as usize;
        // Each buffer needs at least its 4-byte length.
        let mut buffers = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            buffers.push(self.read_buffer(field)?);
        }
        Ok(buffers)
    }

    fn read_text(&mut self, field: &'static str, len: usize) -> Result<String> {
        self.ensure(field, len)?;
        let bytes = self.buf.split_to(len);
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn ensure(&self, field: &'static str, needed: usize) -> Result<()> {
        let available = self.buf.remaining();
        if available < needed {
            return Err(DecodeError::Truncated {
                field,
                needed,
                available,
            });
        }
        Ok(())
    }
}
