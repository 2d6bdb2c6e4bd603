//! Tree composition
//!
//! Replays staged change records onto the tree of a branch other than the
//! one they were computed against. The two trees need not share history.
//!
//! Edits are planned first, entirely in memory: every staged path must still
//! be in the index. Then all removals are applied, then all upserts, so the
//! result does not depend on record order. For a path that is both removed
//! and upserted, the upsert wins; for a path upserted twice, the later record
//! wins.

pub mod scratch_tree;

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::artifacts::composer::scratch_tree::ScratchTree;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::staging::change_record::{ChangeKind, ChangeRecord};
use crate::errors::CommitToError;
use derive_new::new;
use std::path::PathBuf;

/// Validated edits, ready to apply
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EditPlan {
    pub removals: Vec<PathBuf>,
    pub upserts: Vec<(PathBuf, DatabaseEntry)>,
}

#[derive(Debug, new)]
pub struct TreeComposer<'r> {
    database: &'r Database,
}

impl TreeComposer<'_> {
    /// Apply `records` to `base_tree` and persist the result
    ///
    /// Staged content comes from `index`, not from the records, so the tree
    /// holds exactly what is staged at composition time.
    #[cfg(test)]
    pub fn compose(
        &self,
        base_tree: &ObjectId,
        records: &[ChangeRecord],
        index: &Index,
    ) -> anyhow::Result<ObjectId> {
        let plan = Self::plan(records, index)?;
        self.apply(base_tree, plan)
    }

    /// Persist `base_tree` with a validated plan applied
    pub fn apply(&self, base_tree: &ObjectId, plan: EditPlan) -> anyhow::Result<ObjectId> {
        let mut scratch = ScratchTree::new(self.database, Some(base_tree))?;

        for path in &plan.removals {
            if !scratch.remove(path)? {
                log::warn!(
                    "{} is not a file on the target branch; nothing to remove",
                    path.display()
                );
            }
        }

        for (path, entry) in plan.upserts {
            scratch.upsert(&path, entry)?;
        }

        let tree_oid = scratch.write()?;
        log::debug!("composed tree {tree_oid} from {base_tree}");

        Ok(tree_oid)
    }

    /// Resolve every record against the index, without writing anything
    pub fn plan(records: &[ChangeRecord], index: &Index) -> anyhow::Result<EditPlan> {
        let mut plan = EditPlan::default();

        for record in records {
            match record.kind() {
                ChangeKind::Deleted => plan.removals.push(record.path().to_path_buf()),
                ChangeKind::Renamed => {
                    plan.removals.push(record.source_path().to_path_buf());
                    plan.upserts.push(Self::staged(record, index)?);
                }
                ChangeKind::Added | ChangeKind::Modified => {
                    plan.upserts.push(Self::staged(record, index)?)
                }
            }
        }

        Ok(plan)
    }

    fn staged(record: &ChangeRecord, index: &Index) -> anyhow::Result<(PathBuf, DatabaseEntry)> {
        let entry = index
            .entry_by_path(record.path())
            .ok_or_else(|| CommitToError::StaleIndexEntry(record.path().to_path_buf()))?;

        Ok((
            record.path().to_path_buf(),
            DatabaseEntry::new(entry.oid, entry.mode()),
        ))
    }
}
