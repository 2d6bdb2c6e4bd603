//! Staged changes: HEAD's tree against the index

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::staging::change_record::ChangeRecord;
use crate::artifacts::staging::renames::detect_renames;
use crate::errors::CommitToError;
use derive_new::new;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Version 3 extended flag set by `git add --intent-to-add`
const INTENT_TO_ADD: u16 = 0x2000;

#[derive(Debug, new)]
pub struct ChangeExtractor<'r> {
    database: &'r Database,
}

impl ChangeExtractor<'_> {
    /// Changes staged in `index` relative to `head_tree`, sorted by path
    ///
    /// An unborn HEAD (`None`) compares against the empty tree. Unresolved
    /// conflicts abort with [`CommitToError::UnmergedEntry`].
    pub fn extract(
        &self,
        head_tree: Option<&ObjectId>,
        index: &Index,
    ) -> anyhow::Result<Vec<ChangeRecord>> {
        if let Some(path) = index.conflicts().next() {
            return Err(CommitToError::UnmergedEntry(path.clone()).into());
        }

        let mut head = match head_tree {
            Some(tree_oid) => self.database.flatten_tree(tree_oid)?,
            None => BTreeMap::new(),
        };

        let mut records = Vec::new();
        let mut added = Vec::new();

        for entry in index.entries() {
            if entry.metadata.extended_flags & INTENT_TO_ADD != 0 {
                log::debug!("{} is only intended to be added", entry.name.display());
                continue;
            }

            let staged = DatabaseEntry::new(entry.oid, entry.mode());
            match head.remove(&entry.name) {
                None => added.push((entry.name.clone(), staged)),
                Some(old) if !old.same_as(&staged) => {
                    records.push(ChangeRecord::modified(entry.name.clone(), old, staged))
                }
                Some(_) => {}
            }
        }

        // whatever HEAD still holds is gone from the index
        let deleted = head.into_iter().collect::<Vec<(PathBuf, DatabaseEntry)>>();

        let renames = detect_renames(self.database, deleted, added)?;
        records.extend(renames.renamed);
        records.extend(
            renames
                .added
                .into_iter()
                .map(|(path, entry)| ChangeRecord::added(path, entry)),
        );
        records.extend(
            renames
                .deleted
                .into_iter()
                .map(|(path, entry)| ChangeRecord::deleted(path, entry)),
        );

        records.sort_by(|a, b| a.path().cmp(b.path()));
        log::debug!("{} staged change(s)", records.len());

        Ok(records)
    }
}
