use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{ZipError, ZipResult};

/// Little-endian reader over a fixed window of bytes taken from the archive.
///
/// `base` is the absolute file offset of the window's first byte, so a
/// failed read can report where in the archive it happened.
pub struct ByteCursor<'a> {
    inner: Cursor<&'a [u8]>,
    base: u64,
    record: &'static str,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], base: u64, record: &'static str) -> Self {
        Self {
            inner: Cursor::new(data),
            base,
            record,
        }
    }

    /// Position relative to the start of the window.
    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    /// Position as an absolute archive offset.
    pub fn absolute(&self) -> u64 {
        self.base + self.inner.position()
    }

    pub fn remaining(&self) -> usize {
        self.len() - self.position()
    }

    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move to `pos` within the window. Seeking to the very end is allowed.
    pub fn seek(&mut self, pos: usize) -> ZipResult<()> {
        if pos > self.len() {
            return Err(self.truncated_at(pos as u64));
        }
        self.inner.set_position(pos as u64);
        Ok(())
    }

    /// Relative seek; never moves outside the window.
    pub fn skip(&mut self, delta: i64) -> ZipResult<()> {
        let target = self.inner.position() as i64 + delta;
        if target < 0 {
            return Err(ZipError::Truncated {
                record: self.record,
                offset: self.base.saturating_sub(target.unsigned_abs()),
            });
        }
        self.seek(target as usize)
    }

    pub fn read_u16(&mut self) -> ZipResult<u16> {
        let at = self.absolute();
        self.inner
            .read_u16::<LittleEndian>()
            .map_err(|e| ZipError::from_read(e, self.record, at))
    }

    pub fn read_u32(&mut self) -> ZipResult<u32> {
        let at = self.absolute();
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(|e| ZipError::from_read(e, self.record, at))
    }

    pub fn read_i16(&mut self) -> ZipResult<i16> {
        let at = self.absolute();
        self.inner
            .read_i16::<LittleEndian>()
            .map_err(|e| ZipError::from_read(e, self.record, at))
    }

    pub fn read_i32(&mut self) -> ZipResult<i32> {
        let at = self.absolute();
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(|e| ZipError::from_read(e, self.record, at))
    }

    /// Read a u16 at a fixed position in the window.
    pub fn u16_at(&mut self, pos: usize) -> ZipResult<u16> {
        self.seek(pos)?;
        self.read_u16()
    }

    /// Read a u32 at a fixed position in the window.
    pub fn u32_at(&mut self, pos: usize) -> ZipResult<u32> {
        self.seek(pos)?;
        self.read_u32()
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_bytes(&mut self, len: usize) -> ZipResult<&'a [u8]> {
        let start = self.position();
        if len > self.remaining() {
            return Err(self.truncated_at(start as u64));
        }
        let data: &'a [u8] = *self.inner.get_ref();
        self.inner.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    fn truncated_at(&self, pos: u64) -> ZipError {
        ZipError::Truncated {
            record: self.record,
            offset: self.base + pos,
        }
    }
}
