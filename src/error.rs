//! Error taxonomy for archive parsing and entry access.
//!
//! Every structural failure names the check that rejected the archive and
//! the absolute byte offset it was looking at. That pair is what separates
//! a truncated download from a deliberately crafted archive.

use std::io;

/// Result alias used throughout the crate.
pub type ZipResult<T> = Result<T, ZipError>;

/// Coarse classification of a [`ZipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Structural framing is broken (no EOCD, truncated records, ...).
    MalformedArchive,
    /// Well formed, but outside what this reader accepts (spanned disks).
    UnsupportedArchive,
    /// Entry uses encryption or an unknown compression method.
    UnsupportedEntry,
    /// Entry metadata is inconsistent or hostile.
    MalformedEntry,
    /// The requested entry is not in the catalog.
    NotFound,
    /// The underlying byte source failed.
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum ZipError {
    #[error("file too short to be a zip archive: {len} bytes")]
    FileTooShort { len: u64 },

    #[error("end of central directory not found between {scan_end:#x} and {scan_start:#x}")]
    EocdNotFound { scan_start: u64, scan_end: u64 },

    #[error("not a zip archive: unexpected signature {found:#010x} at offset 0")]
    NotAZipArchive { found: u32 },

    #[error("truncated {record} at offset {offset:#x}")]
    Truncated { record: &'static str, offset: u64 },

    #[error(
        "central directory at {central_dir_offset:#x} starts past the end of central directory record at {eocd_offset:#x}"
    )]
    CentralDirectoryOutOfBounds {
        central_dir_offset: u64,
        eocd_offset: u64,
    },

    #[error("archive comment of {len} bytes at offset {offset:#x} runs past end of file")]
    CommentOutOfBounds { offset: u64, len: u16 },

    #[error(
        "spanned archives not supported (disk {disk_number}, central directory disk {disk_with_cd}, {entries}/{total_entries} entries) at offset {offset:#x}"
    )]
    SpannedArchive {
        offset: u64,
        disk_number: u16,
        disk_with_cd: u16,
        entries: u16,
        total_entries: u16,
    },

    #[error("encrypted entry rejected by {header} header at offset {offset:#x} (flags {flags:#06x})")]
    EncryptedEntry {
        header: &'static str,
        offset: u64,
        flags: u16,
    },

    #[error("unsupported compression method {method} for `{name}` at offset {offset:#x}")]
    UnsupportedCompressionMethod {
        name: String,
        method: u16,
        offset: u64,
    },

    #[error("malformed central directory entry at offset {offset:#x}: bad signature {found:#010x}")]
    MalformedCentralDirectoryEntry { offset: u64, found: u32 },

    #[error("malformed entry name at offset {offset:#x}: {reason}")]
    MalformedEntryName { offset: u64, reason: &'static str },

    #[error(
        "entry `{name}` at offset {offset:#x} claims local header at {local_header_offset:#x}, not before central directory at {central_dir_offset:#x}"
    )]
    InconsistentOffsets {
        name: String,
        offset: u64,
        local_header_offset: u64,
        central_dir_offset: u64,
    },

    #[error("duplicate entry name `{name}` at offset {offset:#x} (first seen at {first_offset:#x})")]
    DuplicateEntryName {
        name: String,
        offset: u64,
        first_offset: u64,
    },

    #[error("malformed local header for `{name}` at offset {offset:#x}: bad signature {found:#010x}")]
    MalformedLocalHeader {
        name: String,
        offset: u64,
        found: u32,
    },

    #[error("local header name at offset {offset:#x} does not match central directory name `{name}`")]
    LocalNameMismatch { name: String, offset: u64 },

    #[error(
        "data for `{name}` spans {data_offset:#x}..{data_end:#x}, past central directory at {central_dir_offset:#x}"
    )]
    EntryDataOutOfBounds {
        name: String,
        data_offset: u64,
        data_end: u64,
        central_dir_offset: u64,
    },

    #[error("`{name}` (data at {offset:#x}) produced {actual} bytes, central directory declares {expected}")]
    SizeMismatch {
        name: String,
        offset: u64,
        expected: u64,
        actual: u64,
    },

    #[error("corrupt compressed data in `{name}` (data at {offset:#x}): {source}")]
    CorruptEntryData {
        name: String,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("`{name}` (data at {offset:#x}) has CRC-32 {actual:#010x}, central directory declares {expected:#010x}")]
    ChecksumMismatch {
        name: String,
        offset: u64,
        expected: u32,
        actual: u32,
    },

    #[error("entry `{name}` not found")]
    NotFound { name: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ZipError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ZipError::FileTooShort { .. }
            | ZipError::EocdNotFound { .. }
            | ZipError::NotAZipArchive { .. }
            | ZipError::Truncated { .. }
            | ZipError::CentralDirectoryOutOfBounds { .. }
            | ZipError::CommentOutOfBounds { .. } => ErrorCategory::MalformedArchive,
            ZipError::SpannedArchive { .. } => ErrorCategory::UnsupportedArchive,
            ZipError::EncryptedEntry { .. } | ZipError::UnsupportedCompressionMethod { .. } => {
                ErrorCategory::UnsupportedEntry
            }
            ZipError::MalformedCentralDirectoryEntry { .. }
            | ZipError::MalformedEntryName { .. }
            | ZipError::InconsistentOffsets { .. }
            | ZipError::DuplicateEntryName { .. }
            | ZipError::MalformedLocalHeader { .. }
            | ZipError::LocalNameMismatch { .. }
            | ZipError::EntryDataOutOfBounds { .. }
            | ZipError::SizeMismatch { .. }
            | ZipError::CorruptEntryData { .. }
            | ZipError::ChecksumMismatch { .. } => ErrorCategory::MalformedEntry,
            ZipError::NotFound { .. } => ErrorCategory::NotFound,
            ZipError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Byte offset the failing check was examining, when there is one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            ZipError::EocdNotFound { scan_end, .. } => Some(*scan_end),
            ZipError::NotAZipArchive { .. } => Some(0),
            ZipError::Truncated { offset, .. }
            | ZipError::CommentOutOfBounds { offset, .. }
            | ZipError::SpannedArchive { offset, .. }
            | ZipError::EncryptedEntry { offset, .. }
            | ZipError::UnsupportedCompressionMethod { offset, .. }
            | ZipError::MalformedCentralDirectoryEntry { offset, .. }
            | ZipError::MalformedEntryName { offset, .. }
            | ZipError::InconsistentOffsets { offset, .. }
            | ZipError::DuplicateEntryName { offset, .. }
            | ZipError::MalformedLocalHeader { offset, .. }
            | ZipError::LocalNameMismatch { offset, .. }
            | ZipError::SizeMismatch { offset, .. }
            | ZipError::CorruptEntryData { offset, .. }
            | ZipError::ChecksumMismatch { offset, .. } => Some(*offset),
            ZipError::CentralDirectoryOutOfBounds {
                central_dir_offset, ..
            } => Some(*central_dir_offset),
            ZipError::EntryDataOutOfBounds { data_offset, .. } => Some(*data_offset),
            ZipError::FileTooShort { .. } | ZipError::NotFound { .. } | ZipError::Io(_) => None,
        }
    }

    /// Map a failed positioned read of `record` at `offset`.
    ///
    /// Running off the end of the source means the archive is truncated,
    /// anything else is a genuine I/O failure.
    pub(crate) fn from_read(err: io::Error, record: &'static str, offset: u64) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ZipError::Truncated { record, offset }
        } else {
            ZipError::Io(err)
        }
    }

    /// Recover the [`ZipError`] an entry stream wrapped into an `io::Error`.
    pub fn from_stream(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<ZipError>()) {
            return ZipError::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<ZipError>()) {
            Some(Ok(zip)) => *zip,
            _ => ZipError::Io(io::Error::other("entry stream failed")),
        }
    }
}

impl From<ZipError> for io::Error {
    fn from(err: ZipError) -> Self {
        match err {
            ZipError::Io(err) => err,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        let dup = ZipError::DuplicateEntryName {
            name: "classes.dex".into(),
            offset: 0x40,
            first_offset: 0x10,
        };
        assert_eq!(dup.category(), ErrorCategory::MalformedEntry);
        assert_eq!(dup.offset(), Some(0x40));

        let spanned = ZipError::SpannedArchive {
            offset: 0x99,
            disk_number: 1,
            disk_with_cd: 0,
            entries: 1,
            total_entries: 1,
        };
        assert_eq!(spanned.category(), ErrorCategory::UnsupportedArchive);
    }

    #[test]
    fn unexpected_eof_becomes_truncated() {
        let err = ZipError::from_read(
            io::Error::from(io::ErrorKind::UnexpectedEof),
            "local file header",
            0x1234,
        );
        assert!(matches!(
            err,
            ZipError::Truncated {
                record: "local file header",
                offset: 0x1234
            }
        ));
    }

    #[test]
    fn io_error_round_trip_keeps_zip_error() {
        let err: io::Error = ZipError::NotFound {
            name: "AndroidManifest.xml".into(),
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<ZipError>());
        assert!(matches!(inner, Some(ZipError::NotFound { .. })));
    }
}
