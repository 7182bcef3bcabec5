/// Local File Header signature (`PK\x03\x04`)
pub const LFH_SIGNATURE: u32 = 0x0403_4b50;
/// Central Directory Entry signature (`PK\x01\x02`)
pub const CDFH_SIGNATURE: u32 = 0x0201_4b50;
/// End of Central Directory signature (`PK\x05\x06`)
pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;

/// Largest comment the 16-bit EOCD length field can describe, rounded up
/// to the 64 KiB bound used for the backward scan.
pub const MAX_EOCD_SCAN: u64 = 65536;

/// General purpose bit 0: entry is encrypted.
pub const GPBF_ENCRYPTED: u16 = 1 << 0;
/// Flags this reader refuses outright.
pub const GPBF_UNSUPPORTED_MASK: u16 = GPBF_ENCRYPTED;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Decoded End of Central Directory record.
///
/// Only lives for the duration of directory parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EocdRecord {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u64,
    pub cd_offset: u64,
    pub comment_len: u16,
    pub comment: Vec<u8>,
}

/// One validated central directory record.
///
/// Built fresh from decoded bytes and never mutated afterwards. Sizes and
/// offsets are 32-bit on disk and widened here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryEntry {
    pub name: String,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
    pub flags: u16,
    pub comment: Option<String>,
    pub extra: Option<Vec<u8>>,
    /// Offset of this entry's own record inside the central directory.
    pub central_header_offset: u64,
}

impl CentralDirectoryEntry {
    /// Directory entries end with '/'
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & GPBF_ENCRYPTED != 0
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CentralDirectoryEntry {
        CentralDirectoryEntry {
            name: "res/".into(),
            compression_method: CompressionMethod::Stored,
            // 13:45:30
            last_mod_time: (13 << 11) | (45 << 5) | 15,
            // 2013-07-08
            last_mod_date: (33 << 9) | (7 << 5) | 8,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            local_header_offset: 0,
            flags: 0,
            comment: None,
            extra: None,
            central_header_offset: 0,
        }
    }

    #[test]
    fn dos_timestamps_unpack() {
        let e = entry();
        assert_eq!(e.mod_date(), (2013, 7, 8));
        assert_eq!(e.mod_time(), (13, 45, 30));
        assert!(e.is_directory());
        assert!(!e.is_encrypted());
    }

    #[test]
    fn compression_method_round_trips_unknown() {
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(12).as_u16(), 12);
    }
}
