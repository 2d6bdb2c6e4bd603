//! Git index (staging area)
//!
//! The index holds the blob id and mode of every path staged for the next
//! commit. This crate reads it to learn what the user staged; it never
//! changes what is staged.
//!
//! ## Index File Format
//!
//! The index file contains:
//! - Header: signature, version and entry count
//! - Entries: sorted by path, 8-byte aligned
//! - Extensions: cached trees, resolve-undo data and friends (skipped here)
//! - Checksum: SHA-1 of everything above
//!
//! Entries with a non-zero merge stage belong to an unresolved conflict and
//! are tracked separately from the stage-0 entries.

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{
    ENTRY_BLOCK, ENTRY_FIXED_SIZE, EXTENDED_FLAGS_SIZE, IndexEntry,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, SUPPORTED_VERSIONS};
use anyhow::{Context, anyhow};
use byteorder::ByteOrder;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// Git index (staging area)
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    /// Stage-0 entries keyed by path; `String` keeps git's byte order
    entries: BTreeMap<String, IndexEntry>,
    /// Paths with entries at stages 1-3
    conflicts: BTreeSet<PathBuf>,
    header: IndexHeader,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            conflicts: BTreeSet::new(),
            header: IndexHeader::empty(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        path.to_str().and_then(|path| self.entries.get(path))
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &PathBuf> {
        self.conflicts.iter()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.conflicts.clear();
        self.header = IndexHeader::empty();
    }

    /// Load the index from disk
    ///
    /// A missing or empty index file is an empty index (fresh repository).
    /// The file is read under a shared lock.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::File::open(&self.path)
            .with_context(|| format!("unable to open index {}", self.path.display()))?;
        let mut content = Vec::new();
        {
            let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;
            lock.deref_mut().read_to_end(&mut content)?;
        }

        if content.is_empty() {
            return Ok(());
        }

        let mut reader = Checksum::new(Cursor::new(content));
        let header = self.parse_header(&mut reader)?;
        self.parse_entries(&header, &mut reader)?;
        reader
            .verify_rest()
            .with_context(|| format!("corrupt index {}", self.path.display()))?;

        self.header = header;
        log::debug!(
            "read index v{} with {} entries ({} conflicted)",
            self.header.version,
            self.entries.len(),
            self.conflicts.len()
        );

        Ok(())
    }

    fn parse_header(&self, reader: &mut Checksum<Cursor<Vec<u8>>>) -> anyhow::Result<IndexHeader> {
        let header = IndexHeader::deserialize(&reader.read(HEADER_SIZE)?)?;

        if header.marker != SIGNATURE {
            return Err(anyhow!("invalid index file signature"));
        }

        if !SUPPORTED_VERSIONS.contains(&header.version) {
            return Err(anyhow!("unsupported index file version: {}", header.version));
        }

        Ok(header)
    }

    fn parse_entries(
        &mut self,
        header: &IndexHeader,
        reader: &mut Checksum<Cursor<Vec<u8>>>,
    ) -> anyhow::Result<()> {
        for _ in 0..header.entries_count {
            let mut fixed = reader.read(ENTRY_FIXED_SIZE)?.to_vec();
            let flags = byteorder::NetworkEndian::read_u16(&fixed[60..62]);

            if header.version >= 3 && IndexEntry::has_extended_flags(flags) {
                fixed.extend_from_slice(&reader.read(EXTENDED_FLAGS_SIZE)?);
            }

            let name = match IndexEntry::declared_name_len(flags) {
                Some(len) => reader.read(IndexEntry::tail_size(fixed.len(), len))?.to_vec(),
                None => Self::scan_long_name(fixed.len(), reader)?,
            };

            let entry = IndexEntry::deserialize(&fixed, &name)?;
            self.store_entry(entry);
        }

        Ok(())
    }

    /// Paths of 0xfff bytes or more: read aligned blocks until the terminator
    fn scan_long_name(
        fixed_size: usize,
        reader: &mut Checksum<Cursor<Vec<u8>>>,
    ) -> anyhow::Result<Vec<u8>> {
        let mut name = reader
            .read((ENTRY_BLOCK - fixed_size % ENTRY_BLOCK) % ENTRY_BLOCK)?
            .to_vec();

        while !name.contains(&0) {
            name.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
        }

        Ok(name)
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        if entry.stage() != 0 {
            self.conflicts.insert(entry.name.clone());
            return;
        }

        let key = entry.name.to_string_lossy().into_owned();
        self.entries.insert(key, entry);
    }
}

/// Seeding helpers for tests; the command itself never writes the index
#[cfg(test)]
impl Index {
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Stage an entry, replacing any file that occupies one of its parent
    /// directories and any entries below it
    pub fn add(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.entries.remove(&*parent.to_string_lossy());
        }
        self.entries
            .retain(|_, staged| !(staged.name.starts_with(&entry.name) && staged.name != entry.name));
        self.conflicts.remove(&entry.name);

        self.store_entry(entry);
    }

    /// Write the index back as version 2
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        use std::io::Write;

        let mut writer = Checksum::new(Vec::new());

        self.header = IndexHeader {
            entries_count: self.entries.len() as u32,
            ..IndexHeader::empty()
        };
        writer.write(&self.header.serialize()?)?;
        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }
        writer.write_checksum()?;
        let content = writer.into_inner();

        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("unable to open index {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(&content)?;

        Ok(())
    }
}
