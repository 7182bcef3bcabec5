use std::fs::File;
use std::io;

use memmap2::Mmap;

use super::ReadAt;

/// Memory-mapped archive source.
///
/// A mapping has no cursor, so reads are plain slice copies and need no
/// lock.
#[derive(Debug)]
pub struct MappedArchive {
    map: Mmap,
}

impl MappedArchive {
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: the mapping is read-only. Callers must not truncate the
        // file while the archive is open.
        let map = unsafe { Mmap::map(file)? };
        Ok(Self { map })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }
}

impl ReadAt for MappedArchive {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.map.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.map.len() - start);
        buf[..n].copy_from_slice(&self.map[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.map.len() as u64
    }
}
