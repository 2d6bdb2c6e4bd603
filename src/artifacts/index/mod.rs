//! Git index file format
//!
//! The index (also called staging area or cache) records what the next commit
//! would contain. This crate only ever reads it to learn what is staged.
//!
//! ## File Format (Versions 2 and 3)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 or 3 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length):
//!   - 62 bytes of stat data, object id and flags
//!   - 2 bytes of extended flags (version 3, when flagged)
//!   - NUL-padded path, 8-byte aligned
//!
//! Extensions (optional, skipped)
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "DIRC";

/// Version written by this crate
pub const VERSION: u32 = 2;

/// Versions this crate can read
pub const SUPPORTED_VERSIONS: [u32; 2] = [2, 3];
