use serde::{Deserialize, Serialize};

use crate::error::SaveError;

/// How `skip` accounts for the bytes it steps over.
///
/// `Counted` advances the consumed counter together with the offset.
/// `Uncounted` reproduces the older engine, which moved the offset only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipAccounting {
    #[default]
    Counted,
    Uncounted,
}

/// Position-tracking view over a fixed-capacity save buffer.
///
/// One cursor lives for exactly one encode, decode or dry-run pass. The
/// offset only moves forward; `reset` is the single way back to the start.
#[derive(Debug)]
pub struct ByteCursor<B> {
    buf: B,
    offset: usize,
    consumed: usize,
    skip_accounting: SkipAccounting,
}

impl<B: AsRef<[u8]>> ByteCursor<B> {
    pub fn new(buf: B, skip_accounting: SkipAccounting) -> Self {
        Self {
            buf,
            offset: 0,
            consumed: 0,
            skip_accounting,
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.consumed = 0;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes accounted to this pass. Equals `offset` unless uncounted skips
    /// happened.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn capacity(&self) -> usize {
        self.buf.as_ref().len()
    }

    pub fn skip(&mut self, n: usize) {
        self.offset += n;
        if self.skip_accounting == SkipAccounting::Counted {
            self.consumed += n;
        }
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], SaveError> {
        let len = self.capacity();
        let end = self.offset.checked_add(n).filter(|&end| end <= len).ok_or(
            SaveError::UnexpectedEnd {
                offset: self.offset,
                wanted: n,
                len,
            },
        )?;
        let start = self.offset;
        self.offset = end;
        self.consumed += n;
        Ok(&self.buf.as_ref()[start..end])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SaveError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, SaveError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, SaveError> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, SaveError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, SaveError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, SaveError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, SaveError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Read a fixed-width, NUL padded string field.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, SaveError> {
        let bytes = self.read_bytes(n)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(n);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ByteCursor<B> {
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SaveError> {
        let capacity = self.capacity();
        let needed = self.consumed + bytes.len();
        let end = self.offset + bytes.len();
        if needed > capacity || end > capacity {
            return Err(SaveError::BufferOverflow {
                needed: needed.max(end),
                capacity,
            });
        }
        self.buf.as_mut()[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
        self.consumed = needed;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), SaveError> {
        self.write_bytes(&[v])
    }

    pub fn write_i8(&mut self, v: i8) -> Result<(), SaveError> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<(), SaveError> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_i16(&mut self, v: i16) -> Result<(), SaveError> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), SaveError> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<(), SaveError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write `text` into a field of exactly `n` bytes. Longer text is cut so
    /// the field always ends with a NUL, like a bounded `snprintf`.
    pub fn write_fixed_string(&mut self, text: &str, n: usize) -> Result<(), SaveError> {
        let mut field = vec![0u8; n];
        let bytes = text.as_bytes();
        let len = bytes.len().min(n.saturating_sub(1));
        field[..len].copy_from_slice(&bytes[..len]);
        self.write_bytes(&field)
    }

    pub fn zero_fill(&mut self) {
        self.buf.as_mut().fill(0);
    }
}
