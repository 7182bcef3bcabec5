//! Central directory decoding.
//!
//! Entries are read sequentially through a buffered reader bounded to
//! `[cd_offset, eocd_offset)`, one fixed-size header at a time into a single
//! reusable buffer. The first failing check aborts the whole parse so a
//! partially built catalog never escapes.

use std::io::{BufReader, Read};

use crate::error::{ZipError, ZipResult};
use crate::io::ReadAt;

use super::catalog::EntryCatalog;
use super::cursor::ByteCursor;
use super::layout::{CentralFields, FieldLayout};
use super::stream::BoundedReader;
use super::structures::{
    CentralDirectoryEntry, CompressionMethod, EocdRecord, GPBF_UNSUPPORTED_MASK,
};

const CD_BUFFER_SIZE: usize = 4096;

/// Decode every central directory entry described by `eocd` into a catalog.
///
/// # Errors
///
/// Fails on the first entry with a bad signature, encryption flag, NUL or
/// non-UTF-8 name, a local header offset at or past the central directory,
/// or a name already in the catalog.
pub fn parse_entries<S: ReadAt + ?Sized>(
    source: &S,
    layout: &dyn FieldLayout,
    eocd: &EocdRecord,
    eocd_offset: u64,
) -> ZipResult<EntryCatalog> {
    let fields = layout.central();
    let mut reader = BufReader::with_capacity(
        CD_BUFFER_SIZE,
        BoundedReader::new(source, eocd.cd_offset, eocd_offset),
    );
    let mut catalog = EntryCatalog::with_capacity(eocd.total_entries as usize);
    let mut header = vec![0u8; fields.size];
    let mut offset = eocd.cd_offset;

    for _ in 0..eocd.total_entries {
        let (entry, record_len) =
            read_entry(&mut reader, &mut header, fields, offset, eocd.cd_offset)?;

        tracing::debug!(
            offset = format_args!("{:#x}", offset),
            lfh_offset = format_args!("{:#x}", entry.local_header_offset),
            method = entry.compression_method.as_u16(),
            compressed = entry.compressed_size,
            uncompressed = entry.uncompressed_size,
            name = %entry.name,
            "decoded central directory entry"
        );

        if let Err(e) = catalog.insert(entry) {
            tracing::warn!(error = %e, "rejecting archive with duplicate entry");
            return Err(e);
        }
        offset += record_len;
    }

    Ok(catalog)
}

/// Decode one entry starting at `offset`, returning it with the total size
/// of its record (fixed header plus name, extra field and comment).
fn read_entry<R: Read>(
    reader: &mut R,
    header: &mut [u8],
    fields: &CentralFields,
    offset: u64,
    cd_offset: u64,
) -> ZipResult<(CentralDirectoryEntry, u64)> {
    const RECORD: &str = "central directory entry";

    reader
        .read_exact(header)
        .map_err(|e| ZipError::from_read(e, RECORD, offset))?;
    let mut cursor = ByteCursor::new(header, offset, RECORD);

    let found = cursor.u32_at(0)?;
    if found != fields.signature {
        return Err(ZipError::MalformedCentralDirectoryEntry { offset, found });
    }

    let flags = cursor.u16_at(fields.flags)?;
    if flags & GPBF_UNSUPPORTED_MASK != 0 {
        tracing::warn!(
            offset = format_args!("{:#x}", offset),
            flags,
            "central directory entry is encrypted"
        );
        return Err(ZipError::EncryptedEntry {
            header: "central",
            offset,
            flags,
        });
    }

    let compression_method = CompressionMethod::from_u16(cursor.u16_at(fields.compression_method)?);
    let last_mod_time = cursor.u16_at(fields.last_mod_time)?;
    let last_mod_date = cursor.u16_at(fields.last_mod_date)?;
    let crc32 = cursor.u32_at(fields.crc32)?;
    let compressed_size = cursor.u32_at(fields.compressed_size)? as u64;
    let uncompressed_size = cursor.u32_at(fields.uncompressed_size)? as u64;
    let name_len = cursor.u16_at(fields.name_len)? as usize;
    let extra_len = cursor.u16_at(fields.extra_len)? as usize;
    let comment_len = cursor.u16_at(fields.comment_len)? as usize;
    let local_header_offset = cursor.u32_at(fields.local_header_offset)? as u64;

    let name_offset = offset + fields.size as u64;
    let name_bytes = read_vec(reader, name_len, name_offset)?;
    let name = decode_name(name_bytes, name_offset)?;

    let extra_offset = name_offset + name_len as u64;
    let extra = match extra_len {
        0 => None,
        n => Some(read_vec(reader, n, extra_offset)?),
    };

    let comment_offset = extra_offset + extra_len as u64;
    let comment = match comment_len {
        0 => None,
        n => {
            let bytes = read_vec(reader, n, comment_offset)?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
    };

    if local_header_offset >= cd_offset {
        tracing::warn!(
            offset = format_args!("{:#x}", offset),
            lfh_offset = format_args!("{:#x}", local_header_offset),
            %name,
            "local header offset inside or past central directory"
        );
        return Err(ZipError::InconsistentOffsets {
            name,
            offset,
            local_header_offset,
            central_dir_offset: cd_offset,
        });
    }

    let record_len = (fields.size + name_len + extra_len + comment_len) as u64;
    Ok((
        CentralDirectoryEntry {
            name,
            compression_method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            local_header_offset,
            flags,
            comment,
            extra,
            central_header_offset: offset,
        },
        record_len,
    ))
}

fn read_vec<R: Read>(reader: &mut R, len: usize, offset: u64) -> ZipResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .map_err(|e| ZipError::from_read(e, "central directory entry", offset))?;
    Ok(buf)
}

/// A NUL byte would let two C-string based readers disagree on where the
/// name ends, and lossy UTF-8 would let distinct byte strings share a name.
fn decode_name(bytes: Vec<u8>, offset: u64) -> ZipResult<String> {
    if let Some(pos) = bytes.iter().position(|&b| b == 0) {
        return Err(ZipError::MalformedEntryName {
            offset: offset + pos as u64,
            reason: "name contains NUL byte",
        });
    }
    String::from_utf8(bytes).map_err(|e| ZipError::MalformedEntryName {
        offset: offset + e.utf8_error().valid_up_to() as u64,
        reason: "name is not valid UTF-8",
    })
}
