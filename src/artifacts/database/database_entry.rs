use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// An object reference with its mode, as found in trees
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct DatabaseEntry {
    pub oid: ObjectId,
    pub mode: EntryMode,
}

impl DatabaseEntry {
    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }

    /// Same object under the same canonical mode
    pub fn same_as(&self, other: &DatabaseEntry) -> bool {
        self.oid == other.oid && self.mode.canonical() == other.mode.canonical()
    }
}
