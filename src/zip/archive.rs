use std::io::Read;

use crate::config::ArchiveConfig;
use crate::error::{ZipError, ZipResult};
use crate::io::ReadAt;

use super::catalog::EntryCatalog;
use super::locator;
use super::parser;
use super::stream::{self, EntryStream};
use super::structures::CentralDirectoryEntry;

/// Upper bound on the buffer pre-allocated by [`ZipArchive::read_to_vec`];
/// the declared size is attacker controlled.
const MAX_PREALLOC: u64 = 1 << 20;

/// An opened archive: the byte source plus its validated catalog.
///
/// The catalog is built once, in [`ZipArchive::with_config`], and is the
/// only thing entry reads are resolved against.
pub struct ZipArchive<S> {
    source: S,
    config: ArchiveConfig,
    catalog: EntryCatalog,
    central_dir_offset: u64,
    eocd_offset: u64,
    comment: Vec<u8>,
}

impl<S: ReadAt> ZipArchive<S> {
    pub fn new(source: S) -> ZipResult<Self> {
        Self::with_config(source, ArchiveConfig::default())
    }

    /// Locate the central directory and parse every entry.
    ///
    /// Fails on the first violation; no partial catalog is ever exposed.
    pub fn with_config(source: S, config: ArchiveConfig) -> ZipResult<Self> {
        let layout = config.field_layout();
        let opened = locator::locate(&source, layout, config.require_local_header_at_start)
            .and_then(|(eocd, eocd_offset)| {
                let catalog = parser::parse_entries(&source, layout, &eocd, eocd_offset)?;
                Ok((eocd, eocd_offset, catalog))
            });

        let (eocd, eocd_offset, catalog) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    offset = ?e.offset(),
                    layout = layout.name(),
                    "rejecting archive"
                );
                return Err(e);
            }
        };

        tracing::debug!(
            entries = catalog.len(),
            layout = layout.name(),
            "opened archive"
        );

        Ok(Self {
            source,
            config,
            catalog,
            central_dir_offset: eocd.cd_offset,
            eocd_offset,
            comment: eocd.comment,
        })
    }

    pub fn catalog(&self) -> &EntryCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.catalog.names()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CentralDirectoryEntry> {
        self.catalog.iter()
    }

    pub fn entry(&self, name: &str) -> Option<&CentralDirectoryEntry> {
        self.catalog.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.contains(name)
    }

    /// Archive comment from the end of central directory record.
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn central_dir_offset(&self) -> u64 {
        self.central_dir_offset
    }

    pub fn eocd_offset(&self) -> u64 {
        self.eocd_offset
    }

    /// Open the data of the entry called `name`.
    pub fn open(&self, name: &str) -> ZipResult<EntryStream<'_, S>> {
        let result = stream::open(
            &self.source,
            &self.catalog,
            self.central_dir_offset,
            &self.config,
            name,
        );
        if let Err(e) = &result {
            tracing::warn!(error = %e, name, "failed to open entry");
        }
        result
    }

    /// Open `entry` by its name. The object passed in is only used for its
    /// name; what gets read is whatever the catalog holds under that name.
    pub fn open_entry(&self, entry: &CentralDirectoryEntry) -> ZipResult<EntryStream<'_, S>> {
        self.open(&entry.name)
    }

    /// Read a whole entry into memory.
    pub fn read_to_vec(&self, name: &str) -> ZipResult<Vec<u8>> {
        let mut stream = self.open(name)?;
        let mut buf = Vec::with_capacity(stream.entry().uncompressed_size.min(MAX_PREALLOC) as usize);
        stream
            .read_to_end(&mut buf)
            .map_err(ZipError::from_stream)?;
        Ok(buf)
    }

    /// Close the archive and hand back the source.
    pub fn close(self) -> S {
        self.source
    }
}
