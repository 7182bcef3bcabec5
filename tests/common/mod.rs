//! Raw archive builder for tests.
//!
//! Writes every record byte by byte so tests can produce archives no
//! well-behaved writer would: duplicate names, local headers that disagree
//! with the central directory, encryption flags on one side only, and so on.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::{Cursor, Write};

use zipguard::{ArchiveConfig, ArchiveHandle, ZipArchive, ZipResult};

pub const STORED: u16 = 0;
pub const DEFLATED: u16 = 8;

/// 2013-07-08 13:45:30
pub const DOS_TIME: u16 = (13 << 11) | (45 << 5) | 15;
pub const DOS_DATE: u16 = (33 << 9) | (7 << 5) | 8;

#[derive(Clone)]
pub struct EntrySpec {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
    pub method: u16,
    pub local_method: Option<u16>,
    pub central_flags: u16,
    pub local_flags: u16,
    pub local_name: Option<Vec<u8>>,
    pub local_extra: Vec<u8>,
    pub central_extra: Vec<u8>,
    pub comment: Vec<u8>,
    pub trailing: Vec<u8>,
    pub crc32: Option<u32>,
    pub compressed_size: Option<u32>,
    pub uncompressed_size: Option<u32>,
    pub local_header_offset: Option<u32>,
    pub central_signature: Option<u32>,
    pub local_signature: Option<u32>,
}

impl EntrySpec {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self::new(name.as_bytes(), data, STORED)
    }

    pub fn deflated(name: &str, data: &[u8]) -> Self {
        Self::new(name.as_bytes(), data, DEFLATED)
    }

    pub fn new(name: &[u8], data: &[u8], method: u16) -> Self {
        Self {
            name: name.to_vec(),
            data: data.to_vec(),
            method,
            local_method: None,
            central_flags: 0,
            local_flags: 0,
            local_name: None,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            comment: Vec::new(),
            trailing: Vec::new(),
            crc32: None,
            compressed_size: None,
            uncompressed_size: None,
            local_header_offset: None,
            central_signature: None,
            local_signature: None,
        }
    }

    pub fn central_flags(mut self, flags: u16) -> Self {
        self.central_flags = flags;
        self
    }

    pub fn local_flags(mut self, flags: u16) -> Self {
        self.local_flags = flags;
        self
    }

    pub fn local_method(mut self, method: u16) -> Self {
        self.local_method = Some(method);
        self
    }

    pub fn local_name(mut self, name: &[u8]) -> Self {
        self.local_name = Some(name.to_vec());
        self
    }

    pub fn local_extra(mut self, extra: &[u8]) -> Self {
        self.local_extra = extra.to_vec();
        self
    }

    pub fn central_extra(mut self, extra: &[u8]) -> Self {
        self.central_extra = extra.to_vec();
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Bytes written after the entry data, outside its declared size.
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing = bytes.to_vec();
        self
    }

    pub fn crc32(mut self, crc: u32) -> Self {
        self.crc32 = Some(crc);
        self
    }

    pub fn compressed_size(mut self, size: u32) -> Self {
        self.compressed_size = Some(size);
        self
    }

    pub fn uncompressed_size(mut self, size: u32) -> Self {
        self.uncompressed_size = Some(size);
        self
    }

    pub fn local_header_offset(mut self, offset: u32) -> Self {
        self.local_header_offset = Some(offset);
        self
    }

    pub fn central_signature(mut self, signature: u32) -> Self {
        self.central_signature = Some(signature);
        self
    }

    pub fn local_signature(mut self, signature: u32) -> Self {
        self.local_signature = Some(signature);
        self
    }
}

#[derive(Default)]
pub struct ArchiveBuilder {
    entries: Vec<EntrySpec>,
    prefix: Vec<u8>,
    comment: Vec<u8>,
    trailing: Vec<u8>,
    disk_number: u16,
    disk_entries: Option<u16>,
    cd_offset: Option<u32>,
}

/// A built archive plus the offsets tests want to assert against.
pub struct Built {
    pub bytes: Vec<u8>,
    pub local_offsets: Vec<u64>,
    pub data_offsets: Vec<u64>,
    pub cd_offset: u64,
    pub eocd_offset: u64,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, spec: EntrySpec) -> Self {
        self.entries.push(spec);
        self
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(EntrySpec::stored(name, data))
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.entry(EntrySpec::deflated(name, data))
    }

    pub fn prefix(mut self, bytes: &[u8]) -> Self {
        self.prefix = bytes.to_vec();
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing = bytes.to_vec();
        self
    }

    pub fn disk_number(mut self, disk: u16) -> Self {
        self.disk_number = disk;
        self
    }

    pub fn disk_entries(mut self, count: u16) -> Self {
        self.disk_entries = Some(count);
        self
    }

    pub fn cd_offset(mut self, offset: u32) -> Self {
        self.cd_offset = Some(offset);
        self
    }

    pub fn build(&self) -> Built {
        let mut out = self.prefix.clone();
        let mut local_offsets = Vec::new();
        let mut data_offsets = Vec::new();
        let mut compressed_sizes = Vec::new();

        for spec in &self.entries {
            let compressed = compress(spec.method, &spec.data);
            let local_name = spec.local_name.as_ref().unwrap_or(&spec.name);

            local_offsets.push(out.len() as u64);
            out.write_u32::<LittleEndian>(spec.local_signature.unwrap_or(0x0403_4b50))
                .unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(spec.local_flags).unwrap();
            out.write_u16::<LittleEndian>(spec.local_method.unwrap_or(spec.method))
                .unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(crc32fast::hash(&spec.data)).unwrap();
            out.write_u32::<LittleEndian>(compressed.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(spec.data.len() as u32).unwrap();
            out.write_u16::<LittleEndian>(local_name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(spec.local_extra.len() as u16).unwrap();
            out.extend_from_slice(local_name);
            out.extend_from_slice(&spec.local_extra);

            data_offsets.push(out.len() as u64);
            out.extend_from_slice(&compressed);
            out.extend_from_slice(&spec.trailing);
            compressed_sizes.push(compressed.len() as u32);
        }

        let cd_offset = out.len() as u64;
        for (i, spec) in self.entries.iter().enumerate() {
            out.write_u32::<LittleEndian>(spec.central_signature.unwrap_or(0x0201_4b50))
                .unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(spec.central_flags).unwrap();
            out.write_u16::<LittleEndian>(spec.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(spec.crc32.unwrap_or_else(|| crc32fast::hash(&spec.data)))
                .unwrap();
            out.write_u32::<LittleEndian>(spec.compressed_size.unwrap_or(compressed_sizes[i]))
                .unwrap();
            out.write_u32::<LittleEndian>(spec.uncompressed_size.unwrap_or(spec.data.len() as u32))
                .unwrap();
            out.write_u16::<LittleEndian>(spec.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(spec.central_extra.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(spec.comment.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(
                spec.local_header_offset.unwrap_or(local_offsets[i] as u32),
            )
            .unwrap();
            out.extend_from_slice(&spec.name);
            out.extend_from_slice(&spec.central_extra);
            out.extend_from_slice(&spec.comment);
        }
        let cd_size = out.len() as u64 - cd_offset;

        let eocd_offset = out.len() as u64;
        let count = self.entries.len() as u16;
        out.write_u32::<LittleEndian>(0x0605_4b50).unwrap();
        out.write_u16::<LittleEndian>(self.disk_number).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.disk_entries.unwrap_or(count)).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(cd_size as u32).unwrap();
        out.write_u32::<LittleEndian>(self.cd_offset.unwrap_or(cd_offset as u32))
            .unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out.extend_from_slice(&self.trailing);

        Built {
            bytes: out,
            local_offsets,
            data_offsets,
            cd_offset,
            eocd_offset,
        }
    }
}

pub fn compress(method: u16, data: &[u8]) -> Vec<u8> {
    match method {
        DEFLATED => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        _ => data.to_vec(),
    }
}

pub type MemoryArchive = ZipArchive<ArchiveHandle<Cursor<Vec<u8>>>>;

pub fn open(bytes: Vec<u8>) -> ZipResult<MemoryArchive> {
    open_with(bytes, ArchiveConfig::default())
}

pub fn open_with(bytes: Vec<u8>, config: ArchiveConfig) -> ZipResult<MemoryArchive> {
    let handle = ArchiveHandle::new(Cursor::new(bytes))?;
    ZipArchive::with_config(handle, config)
}

/// Some compressible, non-trivial text.
pub fn sample_text(lines: usize) -> Vec<u8> {
    (0..lines)
        .map(|i| format!("line {i}: the quick brown fox jumps over the lazy dog\n"))
        .collect::<String>()
        .into_bytes()
}
