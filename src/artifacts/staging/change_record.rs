use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeKind {
    /// Label used by `git status` listings
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Added => "new file",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
        }
    }
}

/// One staged path-level change, as seen between HEAD and the index
///
/// `mode` and `blob_id` describe the staged side and are absent for
/// deletions. `old` is the HEAD side and is absent for additions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    path: PathBuf,
    old_path: Option<PathBuf>,
    kind: ChangeKind,
    mode: Option<EntryMode>,
    blob_id: Option<ObjectId>,
    old: Option<DatabaseEntry>,
    similarity: Option<u8>,
}

impl ChangeRecord {
    pub fn added(path: PathBuf, new: DatabaseEntry) -> Self {
        ChangeRecord {
            path,
            old_path: None,
            kind: ChangeKind::Added,
            mode: Some(new.mode),
            blob_id: Some(new.oid),
            old: None,
            similarity: None,
        }
    }

    pub fn modified(path: PathBuf, old: DatabaseEntry, new: DatabaseEntry) -> Self {
        ChangeRecord {
            path,
            old_path: None,
            kind: ChangeKind::Modified,
            mode: Some(new.mode),
            blob_id: Some(new.oid),
            old: Some(old),
            similarity: None,
        }
    }

    pub fn deleted(path: PathBuf, old: DatabaseEntry) -> Self {
        ChangeRecord {
            path,
            old_path: None,
            kind: ChangeKind::Deleted,
            mode: None,
            blob_id: None,
            old: Some(old),
            similarity: None,
        }
    }

    pub fn renamed(
        old_path: PathBuf,
        path: PathBuf,
        old: DatabaseEntry,
        new: DatabaseEntry,
        similarity: u8,
    ) -> Self {
        ChangeRecord {
            path,
            old_path: Some(old_path),
            kind: ChangeKind::Renamed,
            mode: Some(new.mode),
            blob_id: Some(new.oid),
            old: Some(old),
            similarity: Some(similarity),
        }
    }

    /// Final path of the change (the destination for renames)
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn old_path(&self) -> Option<&Path> {
        self.old_path.as_deref()
    }

    /// Path on the HEAD side
    pub fn source_path(&self) -> &Path {
        self.old_path.as_deref().unwrap_or(&self.path)
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn mode(&self) -> Option<EntryMode> {
        self.mode
    }

    pub fn blob_id(&self) -> Option<&ObjectId> {
        self.blob_id.as_ref()
    }

    pub fn old(&self) -> Option<&DatabaseEntry> {
        self.old.as_ref()
    }

    pub fn new_entry(&self) -> Option<DatabaseEntry> {
        Some(DatabaseEntry::new(self.blob_id?, self.mode?))
    }

    /// Rename score in percent
    pub fn similarity(&self) -> Option<u8> {
        self.similarity
    }

    /// Status line body, e.g. `renamed:    old.txt -> new.txt`
    pub fn status_line(&self) -> String {
        let label = format!("{}:", self.kind.label());
        match &self.old_path {
            Some(old_path) => format!(
                "{label:<12}{} -> {}",
                old_path.display(),
                self.path.display()
            ),
            None => format!("{label:<12}{}", self.path.display()),
        }
    }
}
