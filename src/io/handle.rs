use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Mutex;

use super::ReadAt;

/// Exclusively owned, seekable byte source plus its total length.
///
/// Entry streams interleave reads against the single underlying handle, so
/// every read is a "seek to X, then read N bytes" pair executed under one
/// mutex. No caller ever sees the handle's cursor.
#[derive(Debug)]
pub struct ArchiveHandle<R> {
    inner: Mutex<R>,
    len: u64,
}

impl<R: Read + Seek> ArchiveHandle<R> {
    pub fn new(mut reader: R) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: Mutex::new(reader),
            len,
        })
    }

    /// Give the source back. Taking `self` by value means no stream can
    /// still be reading from it.
    pub fn into_inner(self) -> R {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, R>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("archive handle lock poisoned"))
    }
}

impl<R: Read + Seek + Send> ReadAt for ArchiveHandle<R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || offset >= self.len {
            return Ok(0);
        }
        let mut inner = self.lock()?;
        inner.seek(SeekFrom::Start(offset))?;
        inner.read(buf)
    }

    fn size(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        // One critical section for the whole record
        let mut inner = self.lock()?;
        inner.seek(SeekFrom::Start(offset))?;
        inner.read_exact(buf)
    }
}
