use crate::error::ScaleError;


/// Cursor over a SCALE encoded byte string.
///
/// All decoding in this crate goes through a reader so that offsets are
/// tracked for error reporting and for capturing the raw bytes of a value.
pub struct ScaleReader<'a> {
    data: &'a [u8],
    pos: usize,
}


impl<'a> ScaleReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ScaleReader { data, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Raw bytes consumed since `start`, which must be an earlier `pos()`.
    pub fn taken_since(&self, start: usize) -> &'a [u8] {
        &self.data[start..self.pos]
    }

    pub fn byte(&mut self) -> Result<u8, ScaleError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(ScaleError::UnexpectedEof(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], ScaleError> {
        if self.remaining() < len {
            return Err(ScaleError::UnexpectedEof(self.data.len()));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn u16(&mut self) -> Result<u16, ScaleError> {
        let raw = self.bytes(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, ScaleError> {
        let raw = self.bytes(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn u64(&mut self) -> Result<u64, ScaleError> {
        let raw = self.bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn u128(&mut self) -> Result<u128, ScaleError> {
        let raw = self.bytes(16)?;
        let mut buf = [0u8; 16];
        buf.copy_from_slice(raw);
        Ok(u128::from_le_bytes(buf))
    }

    /// Compact integer, all four length modes.
    pub fn compact_u128(&mut self) -> Result<u128, ScaleError> {
        let b0 = self.byte()?;
        match b0 & 0b11 {
            0 => Ok((b0 >> 2) as u128),
            1 => {
                let b1 = self.byte()?;
                Ok((u16::from_le_bytes([b0, b1]) >> 2) as u128)
            }
            2 => {
                let rest = self.bytes(3)?;
                let word = u32::from_le_bytes([b0, rest[0], rest[1], rest[2]]);
                Ok((word >> 2) as u128)
            }
            _ => {
                let len = (b0 >> 2) as usize + 4;
                if len > 16 {
                    return Err(ScaleError::invalid(format!(
                        "compact integer of {len} bytes exceeds u128"
                    )));
                }
                let raw = self.bytes(len)?;
                let mut buf = [0u8; 16];
                buf[..len].copy_from_slice(raw);
                Ok(u128::from_le_bytes(buf))
            }
        }
    }

    pub fn compact_u32(&mut self) -> Result<u32, ScaleError> {
        let value = self.compact_u128()?;
        u32::try_from(value)
            .map_err(|_| ScaleError::invalid(format!("compact value {value} exceeds u32")))
    }

    pub fn compact_len(&mut self) -> Result<usize, ScaleError> {
        Ok(self.compact_u32()? as usize)
    }

    /// Compact length prefix followed by that many raw bytes.
    pub fn byte_string(&mut self) -> Result<&'a [u8], ScaleError> {
        let len = self.compact_len()?;
        self.bytes(len)
    }

    pub fn string(&mut self) -> Result<String, ScaleError> {
        let raw = self.byte_string()?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| ScaleError::invalid("string is not valid utf-8"))
    }

    /// Fails when the value did not consume the whole input.
    pub fn expect_end(&self) -> Result<(), ScaleError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ScaleError::LeftoverBytes(self.remaining()))
        }
    }
}
