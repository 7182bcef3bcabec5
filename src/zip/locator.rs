//! Locates the End of Central Directory record.
//!
//! The EOCD sits at the end of the file, optionally followed by a comment of
//! up to 64 KiB. The scan starts where a comment-less EOCD would begin and
//! walks backwards one byte at a time, never further than 64 KiB and never
//! before offset 0. The first signature met from the end wins.

use crate::error::{ZipError, ZipResult};
use crate::io::ReadAt;

use super::cursor::ByteCursor;
use super::layout::FieldLayout;
use super::structures::{EOCD_SIGNATURE, EocdRecord, LFH_SIGNATURE, MAX_EOCD_SCAN};

/// Find and decode the EOCD.
///
/// # Returns
///
/// A tuple of (EOCD record, offset of EOCD in file).
///
/// # Errors
///
/// `FileTooShort` if the source cannot hold an EOCD, `EocdNotFound` if the
/// scan window holds no signature, `NotAZipArchive` if
/// `require_local_header` is set and the file does not open with a local
/// header, `SpannedArchive` for multi-disk archives.
pub fn locate<S: ReadAt + ?Sized>(
    source: &S,
    layout: &dyn FieldLayout,
    require_local_header: bool,
) -> ZipResult<(EocdRecord, u64)> {
    let fields = layout.eocd();
    let len = source.size();
    let fixed = fields.size as u64;

    if len < fixed {
        return Err(ZipError::FileTooShort { len });
    }
    let scan_start = len - fixed;
    let scan_end = scan_start.saturating_sub(MAX_EOCD_SCAN);

    // Everything from the lowest candidate to end of file, in one read.
    let mut window = vec![0u8; (len - scan_end) as usize];
    source
        .read_exact_at(scan_end, &mut window)
        .map_err(|e| ZipError::from_read(e, "end of central directory", scan_end))?;

    let signature = fields.signature.to_le_bytes();
    let found = (0..=(scan_start - scan_end) as usize)
        .rev()
        .find(|&i| window[i..i + 4] == signature)
        .ok_or(ZipError::EocdNotFound {
            scan_start,
            scan_end,
        })?;
    let eocd_offset = scan_end + found as u64;

    let mut cursor = ByteCursor::new(
        &window[found..found + fields.size],
        eocd_offset,
        "end of central directory",
    );
    let disk_number = cursor.u16_at(fields.disk_number)?;
    let disk_with_cd = cursor.u16_at(fields.disk_with_cd)?;
    let disk_entries = cursor.u16_at(fields.disk_entries)?;
    let total_entries = cursor.u16_at(fields.total_entries)?;
    let cd_size = cursor.u32_at(fields.cd_size)? as u64;
    let cd_offset = cursor.u32_at(fields.cd_offset)? as u64;
    let comment_len = cursor.u16_at(fields.comment_len)?;

    if disk_entries != total_entries || disk_number != 0 || disk_with_cd != 0 {
        tracing::warn!(
            offset = format_args!("{:#x}", eocd_offset),
            disk_number,
            disk_with_cd,
            "rejecting spanned archive"
        );
        return Err(ZipError::SpannedArchive {
            offset: eocd_offset,
            disk_number,
            disk_with_cd,
            entries: disk_entries,
            total_entries,
        });
    }

    if require_local_header {
        check_leading_signature(source, total_entries)?;
    }

    let comment_start = found + fields.size;
    let comment_end = comment_start + comment_len as usize;
    if comment_end > window.len() {
        return Err(ZipError::CommentOutOfBounds {
            offset: eocd_offset + fixed,
            len: comment_len,
        });
    }
    let comment = window[comment_start..comment_end].to_vec();

    if cd_offset > eocd_offset {
        return Err(ZipError::CentralDirectoryOutOfBounds {
            central_dir_offset: cd_offset,
            eocd_offset,
        });
    }

    tracing::debug!(
        offset = format_args!("{:#x}", eocd_offset),
        cd_offset = format_args!("{:#x}", cd_offset),
        cd_size,
        entries = total_entries,
        comment_len,
        "located end of central directory"
    );

    Ok((
        EocdRecord {
            disk_number,
            disk_with_cd,
            disk_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment_len,
            comment,
        },
        eocd_offset,
    ))
}

/// An archive must open with a local header, unless it has no entries at
/// all, in which case the EOCD itself comes first.
fn check_leading_signature<S: ReadAt + ?Sized>(source: &S, total_entries: u16) -> ZipResult<()> {
    let mut head = [0u8; 4];
    source
        .read_exact_at(0, &mut head)
        .map_err(|e| ZipError::from_read(e, "local file header", 0))?;
    let found = u32::from_le_bytes(head);
    if found == LFH_SIGNATURE || (found == EOCD_SIGNATURE && total_entries == 0) {
        Ok(())
    } else {
        Err(ZipError::NotAZipArchive { found })
    }
}
