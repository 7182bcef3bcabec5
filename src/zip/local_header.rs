//! Local file header validation.
//!
//! The local header is only trusted for two things: that it exists where the
//! central directory says, and how many name and extra bytes sit between it
//! and the entry data. How much data there is always comes from the
//! catalogued central directory entry.

use crate::config::ArchiveConfig;
use crate::error::{ZipError, ZipResult};
use crate::io::ReadAt;

use super::cursor::ByteCursor;
use super::layout::NameLengthSource;
use super::structures::{CentralDirectoryEntry, CompressionMethod, GPBF_UNSUPPORTED_MASK};

/// Where an entry's data lives, as established by its local header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalHeaderInfo {
    pub data_offset: u64,
    /// `data_offset + compressed_size` from the central directory.
    pub data_end: u64,
    /// Method used to decode the data. Always the central directory's.
    pub compression_method: CompressionMethod,
}

/// Decode the local header of `entry` and cross-check it.
///
/// # Errors
///
/// `MalformedLocalHeader` on a bad signature, `EncryptedEntry` if the local
/// flags claim encryption, `LocalNameMismatch` if name checking is enabled
/// and the local name differs, `EntryDataOutOfBounds` if the data region
/// would run into the central directory.
pub fn validate<S: ReadAt + ?Sized>(
    source: &S,
    entry: &CentralDirectoryEntry,
    central_dir_offset: u64,
    config: &ArchiveConfig,
) -> ZipResult<LocalHeaderInfo> {
    const RECORD: &str = "local file header";

    let layout = config.field_layout();
    let fields = layout.local();
    let offset = entry.local_header_offset;

    let mut header = vec![0u8; fields.size];
    source
        .read_exact_at(offset, &mut header)
        .map_err(|e| ZipError::from_read(e, RECORD, offset))?;
    let mut cursor = ByteCursor::new(&header, offset, RECORD);

    let found = cursor.u32_at(0)?;
    if found != fields.signature {
        tracing::warn!(
            offset = format_args!("{:#x}", offset),
            found = format_args!("{:#010x}", found),
            name = %entry.name,
            "bad local header signature"
        );
        return Err(ZipError::MalformedLocalHeader {
            name: entry.name.clone(),
            offset,
            found,
        });
    }

    let flags = cursor.u16_at(fields.flags)?;
    if flags & GPBF_UNSUPPORTED_MASK != 0 {
        tracing::warn!(
            offset = format_args!("{:#x}", offset),
            flags,
            name = %entry.name,
            "local header is encrypted"
        );
        return Err(ZipError::EncryptedEntry {
            header: "local",
            offset,
            flags,
        });
    }

    let local_method = CompressionMethod::from_u16(cursor.u16_at(fields.compression_method)?);
    let local_name_len = cursor.u16_at(fields.name_len)? as u64;
    let local_extra_len = cursor.u16_at(fields.extra_len)? as u64;
    let name_offset = offset + fields.size as u64;

    if config.cross_check_local_names {
        check_local_name(source, entry, name_offset, local_name_len)?;
    }

    let name_len = match layout.data_name_length() {
        NameLengthSource::Local => local_name_len,
        NameLengthSource::Central => entry.name.len() as u64,
    };
    let data_offset = name_offset + name_len + local_extra_len;
    let data_end = data_offset + entry.compressed_size;

    if data_end > central_dir_offset {
        return Err(ZipError::EntryDataOutOfBounds {
            name: entry.name.clone(),
            data_offset,
            data_end,
            central_dir_offset,
        });
    }

    if local_method != entry.compression_method {
        tracing::warn!(
            offset = format_args!("{:#x}", offset),
            local = local_method.as_u16(),
            central = entry.compression_method.as_u16(),
            name = %entry.name,
            "local and central compression methods differ, using central"
        );
    }

    tracing::debug!(
        offset = format_args!("{:#x}", offset),
        data_offset = format_args!("{:#x}", data_offset),
        data_end = format_args!("{:#x}", data_end),
        name = %entry.name,
        "validated local header"
    );

    Ok(LocalHeaderInfo {
        data_offset,
        data_end,
        compression_method: entry.compression_method,
    })
}

fn check_local_name<S: ReadAt + ?Sized>(
    source: &S,
    entry: &CentralDirectoryEntry,
    name_offset: u64,
    local_name_len: u64,
) -> ZipResult<()> {
    let mismatch = || ZipError::LocalNameMismatch {
        name: entry.name.clone(),
        offset: name_offset,
    };

    if local_name_len != entry.name.len() as u64 {
        return Err(mismatch());
    }
    let mut local_name = vec![0u8; local_name_len as usize];
    source
        .read_exact_at(name_offset, &mut local_name)
        .map_err(|e| ZipError::from_read(e, "local file header", name_offset))?;
    if local_name != entry.name.as_bytes() {
        tracing::warn!(
            offset = format_args!("{:#x}", name_offset),
            name = %entry.name,
            local = %String::from_utf8_lossy(&local_name),
            "local header name differs from central directory"
        );
        return Err(mismatch());
    }
    Ok(())
}
