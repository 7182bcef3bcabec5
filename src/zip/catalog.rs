use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::{ZipError, ZipResult};

use super::structures::CentralDirectoryEntry;

/// The archive's authoritative list of entries.
///
/// Keyed by name, enumerated in central directory order. A name can only
/// ever be bound once: a second entry with the same name is an error and
/// neither copy is kept in preference to the other.
#[derive(Debug, Default, Clone)]
pub struct EntryCatalog {
    entries: IndexMap<String, CentralDirectoryEntry>,
}

impl EntryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, entry: CentralDirectoryEntry) -> ZipResult<()> {
        match self.entries.entry(entry.name.clone()) {
            Entry::Occupied(existing) => Err(ZipError::DuplicateEntryName {
                name: entry.name,
                offset: entry.central_header_offset,
                first_offset: existing.get().central_header_offset,
            }),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CentralDirectoryEntry> {
        self.entries.get(name)
    }

    pub fn get_index(&self, index: usize) -> Option<&CentralDirectoryEntry> {
        self.entries.get_index(index).map(|(_, entry)| entry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CentralDirectoryEntry> {
        self.entries.values()
    }
}

impl<'a> IntoIterator for &'a EntryCatalog {
    type Item = &'a CentralDirectoryEntry;
    type IntoIter = indexmap::map::Values<'a, String, CentralDirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::CompressionMethod;

    fn entry(name: &str, at: u64, crc32: u32) -> CentralDirectoryEntry {
        CentralDirectoryEntry {
            name: name.into(),
            compression_method: CompressionMethod::Stored,
            last_mod_time: 0,
            last_mod_date: 0,
            crc32,
            compressed_size: 0,
            uncompressed_size: 0,
            local_header_offset: 0,
            flags: 0,
            comment: None,
            extra: None,
            central_header_offset: at,
        }
    }

    #[test]
    fn preserves_insertion_order() {
        let mut catalog = EntryCatalog::new();
        for (i, name) in ["b", "a", "c"].iter().enumerate() {
            catalog.insert(entry(name, i as u64, 0)).unwrap();
        }
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert_eq!(catalog.get_index(1).unwrap().name, "a");
        assert!(catalog.contains("c"));
        assert!(!catalog.contains("d"));
    }

    #[test]
    fn duplicate_does_not_overwrite() {
        let mut catalog = EntryCatalog::new();
        catalog.insert(entry("classes.dex", 0x100, 1)).unwrap();

        let err = catalog.insert(entry("classes.dex", 0x180, 2)).unwrap_err();
        assert!(matches!(
            err,
            ZipError::DuplicateEntryName {
                offset: 0x180,
                first_offset: 0x100,
                ..
            }
        ));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("classes.dex").unwrap().crc32, 1);
    }
}
