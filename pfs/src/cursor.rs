//! Bounds-checked little-endian cursor over an in-memory buffer.
//!
//! Both the archive directory and the WLD fragment stream are decoded from a
//! single contiguous buffer with a lot of absolute seeking, so the cursor
//! checks every reposition against the buffer length up front instead of
//! waiting for a short read.
//!
//! Error policy: fail hard. An out-of-range `set_position` or a read past
//! the end returns `Err` immediately; there is no latched error state.

use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Sequential/random-access reader over a byte slice. All multi-byte reads
/// are little-endian. Mutates only its own position.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(buf),
        }
    }

    /// Total buffer length in bytes.
    pub fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    /// Current read position.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Bytes left between the position and the end of the buffer.
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.position())
    }

    /// Move to an absolute position. Positioning exactly at the end is
    /// allowed (zero bytes remaining); anything past it is an error.
    pub fn set_position(&mut self, position: u64) -> Result<()> {
        if position > self.len() {
            return Err(Error::PositionOutOfRange {
                position,
                len: self.len(),
            });
        }
        self.inner.set_position(position);
        Ok(())
    }

    /// Advance the position by `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let target = self
            .position()
            .checked_add(n)
            .ok_or(Error::PositionOutOfRange {
                position: u64::MAX,
                len: self.len(),
            })?;
        self.set_position(target)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.inner.read_i8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.inner.read_i16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(self.inner.read_f64::<LittleEndian>()?)
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let start = self.position() as usize;
        let end = start
            .checked_add(n)
            .ok_or(Error::PositionOutOfRange {
                position: u64::MAX,
                len: self.len(),
            })?;
        if end as u64 > self.len() {
            return Err(Error::PositionOutOfRange {
                position: end as u64,
                len: self.len(),
            });
        }
        let bytes = &self.inner.get_ref()[start..end];
        self.inner.set_position(end as u64);
        Ok(bytes)
    }

    /// Read bytes up to (and consuming) the next NUL, returned as UTF-8.
    pub fn read_cstring(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        String::from_utf8(bytes).map_err(|_| Error::InvalidName)
    }

    /// Read a NUL-terminated string at an absolute offset without
    /// disturbing the current position.
    pub fn read_cstring_at(&mut self, offset: u64) -> Result<String> {
        let saved = self.position();
        self.set_position(offset)?;
        let result = self.read_cstring();
        self.inner.set_position(saved);
        result
    }
}
