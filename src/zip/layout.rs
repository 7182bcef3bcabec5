//! Where each numeric field lives in the on-disk records.
//!
//! Decoders never hard-code a field position. They ask the [`FieldLayout`]
//! picked when the archive was opened, so older and newer readings of the
//! format share one parser instead of each carrying its own copy.

use std::fmt;

use super::structures::{CDFH_SIGNATURE, EOCD_SIGNATURE, LFH_SIGNATURE};

/// Field positions of the End Of Central Directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EocdFields {
    pub signature: u32,
    pub size: usize,
    pub disk_number: usize,
    pub disk_with_cd: usize,
    pub disk_entries: usize,
    pub total_entries: usize,
    pub cd_size: usize,
    pub cd_offset: usize,
    pub comment_len: usize,
}

/// Field positions of a Central Directory Entry header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentralFields {
    pub signature: u32,
    pub size: usize,
    pub flags: usize,
    pub compression_method: usize,
    pub last_mod_time: usize,
    pub last_mod_date: usize,
    pub crc32: usize,
    pub compressed_size: usize,
    pub uncompressed_size: usize,
    pub name_len: usize,
    pub extra_len: usize,
    pub comment_len: usize,
    pub local_header_offset: usize,
}

/// Field positions of a Local File Header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFields {
    pub signature: u32,
    pub size: usize,
    pub flags: usize,
    pub compression_method: usize,
    pub name_len: usize,
    pub extra_len: usize,
}

/// Which header supplies the name length used to skip to entry data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLengthSource {
    Local,
    Central,
}

pub const APPNOTE_EOCD: EocdFields = EocdFields {
    signature: EOCD_SIGNATURE,
    size: 22,
    disk_number: 4,
    disk_with_cd: 6,
    disk_entries: 8,
    total_entries: 10,
    cd_size: 12,
    cd_offset: 16,
    comment_len: 20,
};

pub const APPNOTE_CENTRAL: CentralFields = CentralFields {
    signature: CDFH_SIGNATURE,
    size: 46,
    flags: 8,
    compression_method: 10,
    last_mod_time: 12,
    last_mod_date: 14,
    crc32: 16,
    compressed_size: 20,
    uncompressed_size: 24,
    name_len: 28,
    extra_len: 30,
    comment_len: 32,
    local_header_offset: 42,
};

pub const APPNOTE_LOCAL: LocalFields = LocalFields {
    signature: LFH_SIGNATURE,
    size: 30,
    flags: 6,
    compression_method: 8,
    name_len: 26,
    extra_len: 28,
};

pub trait FieldLayout: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn eocd(&self) -> &'static EocdFields {
        &APPNOTE_EOCD
    }

    fn central(&self) -> &'static CentralFields {
        &APPNOTE_CENTRAL
    }

    fn local(&self) -> &'static LocalFields {
        &APPNOTE_LOCAL
    }

    /// Name length used when computing where entry data starts.
    fn data_name_length(&self) -> NameLengthSource;
}

/// PKWARE APPNOTE layout. Entry data is located purely from the local
/// header's own name and extra lengths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Appnote;

impl FieldLayout for Appnote {
    fn name(&self) -> &'static str {
        "appnote"
    }

    fn data_name_length(&self) -> NameLengthSource {
        NameLengthSource::Local
    }
}

/// Older platform reading: the name length comes from the central
/// directory entry, only the extra length is taken from the local header.
#[derive(Debug, Clone, Copy, Default)]
pub struct Legacy;

impl FieldLayout for Legacy {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn data_name_length(&self) -> NameLengthSource {
        NameLengthSource::Central
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_sizes_match_record_ends() {
        let eocd = Appnote.eocd();
        assert_eq!(eocd.comment_len + 2, eocd.size);

        let central = Appnote.central();
        assert_eq!(central.local_header_offset + 4, central.size);

        let local = Appnote.local();
        assert_eq!(local.extra_len + 2, local.size);
    }

    #[test]
    fn layouts_differ_only_in_name_length_source() {
        assert_eq!(Appnote.data_name_length(), NameLengthSource::Local);
        assert_eq!(Legacy.data_name_length(), NameLengthSource::Central);
        assert_eq!(Appnote.central(), Legacy.central());
        assert_eq!(Appnote.local(), Legacy.local());
    }
}
