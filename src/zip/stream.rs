//! Entry data streams.
//!
//! [`open`] never accepts an entry object from the caller. It looks the
//! name up in the catalog, re-validates the local header, and only then
//! hands out a stream bounded to `[data_offset, data_offset + compressed_size)`.

use std::io::{self, Read};

use crc32fast::Hasher;
use flate2::read::DeflateDecoder;

use crate::config::ArchiveConfig;
use crate::error::{ZipError, ZipResult};
use crate::io::ReadAt;

use super::catalog::EntryCatalog;
use super::local_header::{self, LocalHeaderInfo};
use super::structures::{CentralDirectoryEntry, CompressionMethod};

const MIN_INFLATE_BUFFER: u64 = 1024;
const MAX_INFLATE_BUFFER: u64 = 65536;

/// Sequential reader over `[pos, end)` of a source.
///
/// Holds no cursor in the source itself: every read is a positioned read,
/// so any number of these can interleave on one source.
pub(crate) struct BoundedReader<'a, S: ?Sized> {
    source: &'a S,
    pos: u64,
    end: u64,
    /// Set once the source itself returned an error.
    source_failed: bool,
}

impl<'a, S: ReadAt + ?Sized> BoundedReader<'a, S> {
    pub(crate) fn new(source: &'a S, start: u64, end: u64) -> Self {
        Self {
            source,
            pos: start,
            end: end.max(start),
            source_failed: false,
        }
    }

    fn remaining(&self) -> u64 {
        self.end - self.pos
    }

    fn source_failed(&self) -> bool {
        self.source_failed
    }
}

impl<S: ReadAt + ?Sized> Read for BoundedReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = (buf.len() as u64).min(self.remaining()) as usize;
        if len == 0 {
            return Ok(0);
        }
        let n = match self.source.read_at(self.pos, &mut buf[..len]) {
            Ok(n) => n,
            Err(e) => {
                self.source_failed = true;
                return Err(e);
            }
        };
        self.pos += n as u64;
        Ok(n)
    }
}

enum Decoder<'a, S: ?Sized> {
    Stored(BoundedReader<'a, S>),
    Deflated(DeflateDecoder<BoundedReader<'a, S>>),
}

/// Readable view of exactly one entry's data.
///
/// Borrows the archive, so it cannot outlive it.
pub struct EntryStream<'a, S: ?Sized> {
    entry: &'a CentralDirectoryEntry,
    info: LocalHeaderInfo,
    decoder: Decoder<'a, S>,
    produced: u64,
    hasher: Option<Hasher>,
    finished: bool,
}

/// Resolve `name` through `catalog` and open its data.
///
/// # Errors
///
/// `NotFound` if the catalog has no such entry, any local header
/// validation error, or `UnsupportedCompressionMethod`.
pub fn open<'a, S: ReadAt + ?Sized>(
    source: &'a S,
    catalog: &'a EntryCatalog,
    central_dir_offset: u64,
    config: &ArchiveConfig,
    name: &str,
) -> ZipResult<EntryStream<'a, S>> {
    let entry = catalog.get(name).ok_or_else(|| ZipError::NotFound {
        name: name.to_string(),
    })?;
    let info = local_header::validate(source, entry, central_dir_offset, config)?;
    let raw = BoundedReader::new(source, info.data_offset, info.data_end);

    let decoder = match info.compression_method {
        CompressionMethod::Stored => Decoder::Stored(raw),
        CompressionMethod::Deflate => {
            let capacity = entry
                .uncompressed_size
                .clamp(MIN_INFLATE_BUFFER, MAX_INFLATE_BUFFER) as usize;
            Decoder::Deflated(DeflateDecoder::new_with_buf(raw, vec![0u8; capacity]))
        }
        CompressionMethod::Unknown(method) => {
            return Err(ZipError::UnsupportedCompressionMethod {
                name: entry.name.clone(),
                method,
                offset: entry.central_header_offset,
            });
        }
    };

    Ok(EntryStream {
        entry,
        info,
        decoder,
        produced: 0,
        hasher: config.verify_checksums.then(Hasher::new),
        finished: false,
    })
}

impl<S: ReadAt + ?Sized> EntryStream<'_, S> {
    /// The catalogued entry this stream reads.
    pub fn entry(&self) -> &CentralDirectoryEntry {
        self.entry
    }

    pub fn data_offset(&self) -> u64 {
        self.info.data_offset
    }

    /// Bytes produced so far.
    pub fn position(&self) -> u64 {
        self.produced
    }

    /// Estimate of how many bytes remain, for callers that poll first.
    ///
    /// Stored entries report the exact raw bytes left. Deflated entries
    /// report `uncompressed_size - produced`, clamped at zero.
    pub fn available(&self) -> u64 {
        if self.finished {
            return 0;
        }
        match &self.decoder {
            Decoder::Stored(raw) => raw.remaining(),
            Decoder::Deflated(_) => self.entry.uncompressed_size.saturating_sub(self.produced),
        }
    }

    fn finish(&mut self) -> ZipResult<()> {
        self.finished = true;
        let Some(hasher) = self.hasher.take() else {
            return Ok(());
        };
        if self.produced != self.entry.uncompressed_size {
            return Err(self.size_mismatch());
        }
        let actual = hasher.finalize();
        if actual != self.entry.crc32 {
            return Err(ZipError::ChecksumMismatch {
                name: self.entry.name.clone(),
                offset: self.info.data_offset,
                expected: self.entry.crc32,
                actual,
            });
        }
        Ok(())
    }

    fn size_mismatch(&self) -> ZipError {
        ZipError::SizeMismatch {
            name: self.entry.name.clone(),
            offset: self.info.data_offset,
            expected: self.entry.uncompressed_size,
            actual: self.produced,
        }
    }
}

impl<S: ReadAt + ?Sized> Read for EntryStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.finished {
            return Ok(0);
        }

        let n = match &mut self.decoder {
            Decoder::Stored(raw) => raw.read(buf)?,
            Decoder::Deflated(inflate) => match inflate.read(buf) {
                Ok(n) => n,
                Err(e) if inflate.get_ref().source_failed() => return Err(e),
                Err(e) => {
                    self.finished = true;
                    return Err(ZipError::CorruptEntryData {
                        name: self.entry.name.clone(),
                        offset: self.info.data_offset,
                        source: e,
                    }
                    .into());
                }
            },
        };
        if n == 0 {
            self.finish()?;
            return Ok(0);
        }

        self.produced += n as u64;
        if self.produced > self.entry.uncompressed_size {
            self.finished = true;
            return Err(self.size_mismatch().into());
        }
        if let Some(hasher) = &mut self.hasher {
            hasher.update(&buf[..n]);
        }
        Ok(n)
    }
}
