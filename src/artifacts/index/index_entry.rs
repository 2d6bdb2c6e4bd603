//! Index entry representation
//!
//! Each entry records a staged path with its blob id, mode and stat data.
//! Stat data only matters to tools that compare against the working tree;
//! it is carried through untouched.
//!
//! ## Flags
//!
//! ```text
//! bit 15     assume-valid
//! bit 14     extended (version 3: two more flag bytes follow)
//! bits 12-13 merge stage (0 = normal, 1-3 = conflict sides)
//! bits 0-11  path length, saturated at 0xfff
//! ```

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::{Context, anyhow};
use byteorder::ByteOrder;
use std::cmp::min;
use std::path::PathBuf;

/// Path lengths at or above this value are stored as this value
pub const MAX_PATH_SIZE: usize = 0xfff;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Stat data, object id and flags preceding the path
pub const ENTRY_FIXED_SIZE: usize = 62;

pub const EXTENDED_FLAGS_SIZE: usize = 2;

const FLAG_EXTENDED: u16 = 0x4000;
const FLAG_STAGE_MASK: u16 = 0x3000;
const FLAG_STAGE_SHIFT: u16 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub name: PathBuf,
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: u32,
    pub ctime_nsec: u32,
    pub mtime: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub flags: u16,
    /// Version 3 extended flags (skip-worktree, intent-to-add)
    pub extended_flags: u16,
}

impl IndexEntry {
    /// A stage-0 entry without stat data
    pub fn new(name: PathBuf, oid: ObjectId, mode: EntryMode) -> Self {
        let flags = min(name.as_os_str().len(), MAX_PATH_SIZE) as u16;

        IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                mode,
                flags,
                ..Default::default()
            },
        }
    }

    pub fn mode(&self) -> EntryMode {
        self.metadata.mode
    }

    /// Merge stage; anything but zero marks an unresolved conflict
    pub fn stage(&self) -> u8 {
        ((self.metadata.flags & FLAG_STAGE_MASK) >> FLAG_STAGE_SHIFT) as u8
    }

    /// Length of the padded on-disk record for a path of `name_len` bytes
    fn padded_size(fixed: usize, name_len: usize) -> usize {
        // at least one NUL, then up to the next block boundary
        (fixed + name_len + ENTRY_BLOCK) / ENTRY_BLOCK * ENTRY_BLOCK
    }

    /// Parse a record whose fixed part (and extended flags, if any) is in
    /// `fixed` and whose NUL-terminated path starts `name`
    pub fn deserialize(fixed: &[u8], name: &[u8]) -> anyhow::Result<Self> {
        if fixed.len() < ENTRY_FIXED_SIZE {
            return Err(anyhow!("invalid index entry size"));
        }

        let read_u32 = |at: usize| byteorder::NetworkEndian::read_u32(&fixed[at..at + 4]);

        let mode = EntryMode::try_from(read_u32(24)).context("invalid mode in index entry")?;
        let mut oid_bytes = &fixed[40..60];
        let oid = ObjectId::read_from(&mut oid_bytes)?;
        let flags = byteorder::NetworkEndian::read_u16(&fixed[60..62]);
        let extended_flags = if fixed.len() >= ENTRY_FIXED_SIZE + EXTENDED_FLAGS_SIZE {
            byteorder::NetworkEndian::read_u16(&fixed[62..64])
        } else {
            0
        };

        let name_end = name
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| anyhow!("missing null terminator in entry name"))?;
        let name = PathBuf::from(
            std::str::from_utf8(&name[..name_end])
                .map_err(|_| anyhow!("invalid UTF-8 in entry name"))?,
        );

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime: read_u32(0),
                ctime_nsec: read_u32(4),
                mtime: read_u32(8),
                mtime_nsec: read_u32(12),
                dev: read_u32(16),
                ino: read_u32(20),
                mode,
                uid: read_u32(28),
                gid: read_u32(32),
                size: read_u32(36),
                flags,
                extended_flags,
            },
        })
    }

    pub fn has_extended_flags(flags: u16) -> bool {
        flags & FLAG_EXTENDED != 0
    }

    /// Declared path length, or `None` when it is saturated and the path must
    /// be scanned for its terminator
    pub fn declared_name_len(flags: u16) -> Option<usize> {
        let len = (flags as usize) & MAX_PATH_SIZE;
        (len < MAX_PATH_SIZE).then_some(len)
    }

    /// Bytes following the fixed part for a path of known length
    pub fn tail_size(fixed: usize, name_len: usize) -> usize {
        Self::padded_size(fixed, name_len) - fixed
    }
}

#[cfg(test)]
impl IndexEntry {
    /// Every proper ancestor directory, outermost first
    pub fn parent_dirs(&self) -> Vec<&std::path::Path> {
        let mut dirs = self
            .name
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();
        dirs
    }

    /// Version 2 record; extended flags are never written
    pub fn serialize(&self) -> anyhow::Result<bytes::Bytes> {
        use byteorder::WriteBytesExt;
        use std::io::Write;

        let entry_name = self
            .name
            .to_str()
            .ok_or_else(|| anyhow!("invalid entry name {:?}", self.name))?;
        let flags = self.metadata.flags & !FLAG_EXTENDED;

        let mut entry_bytes = Vec::new();
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.dev)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ino)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mode.as_u32())?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.uid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.gid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.size)?;
        self.oid.write_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(flags)?;
        entry_bytes.write_all(entry_name.as_bytes())?;

        let padded = Self::padded_size(ENTRY_FIXED_SIZE, entry_name.len());
        entry_bytes.resize(padded, 0);

        Ok(bytes::Bytes::from(entry_bytes))
    }
}
