//! Rename detection between deleted and added paths
//!
//! Two passes, as git does: identical blobs first, then content similarity
//! for what is left. Similarity is the number of bytes in lines both sides
//! share (as multisets) over the size of the larger side.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::staging::change_record::ChangeRecord;
use std::collections::HashMap;
use std::path::PathBuf;

/// Minimum score, in percent, for two paths to count as a rename
pub const RENAME_THRESHOLD: u8 = 50;

/// Larger blobs are only paired when identical
pub const MAX_SIMILARITY_SIZE: usize = 512 * 1024;

/// Inexact detection is skipped when there are more candidate pairs than this
pub const MAX_RENAME_PAIRS: usize = 1000 * 1000;

pub type Side = (PathBuf, DatabaseEntry);

#[derive(Debug, Default)]
pub struct Renames {
    pub renamed: Vec<ChangeRecord>,
    pub deleted: Vec<Side>,
    pub added: Vec<Side>,
}

pub fn detect_renames(
    database: &Database,
    deleted: Vec<Side>,
    added: Vec<Side>,
) -> anyhow::Result<Renames> {
    let mut deleted = deleted.into_iter().map(Some).collect::<Vec<_>>();
    let mut added = added.into_iter().map(Some).collect::<Vec<_>>();
    let mut renamed = Vec::new();

    exact_pass(&mut deleted, &mut added, &mut renamed);
    similarity_pass(database, &mut deleted, &mut added, &mut renamed)?;

    Ok(Renames {
        renamed,
        deleted: deleted.into_iter().flatten().collect(),
        added: added.into_iter().flatten().collect(),
    })
}

fn pair(old: Side, new: Side, similarity: u8) -> ChangeRecord {
    log::debug!(
        "rename {} -> {} ({similarity}%)",
        old.0.display(),
        new.0.display()
    );
    ChangeRecord::renamed(old.0, new.0, old.1, new.1, similarity)
}

fn exact_pass(
    deleted: &mut [Option<Side>],
    added: &mut [Option<Side>],
    renamed: &mut Vec<ChangeRecord>,
) {
    for old_slot in deleted.iter_mut() {
        let Some((old_path, old_entry)) = old_slot.as_ref() else {
            continue;
        };
        if old_entry.mode == EntryMode::Gitlink {
            continue;
        }

        let candidates = added
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|side| (i, side)))
            .filter(|(_, (_, new_entry))| {
                new_entry.oid == old_entry.oid && new_entry.mode != EntryMode::Gitlink
            })
            .collect::<Vec<_>>();

        let chosen = candidates
            .iter()
            .find(|(_, (new_path, _))| new_path.file_name() == old_path.file_name())
            .or_else(|| candidates.first())
            .map(|(i, _)| *i);

        if let Some(i) = chosen
            && let (Some(old), Some(new)) = (old_slot.take(), added[i].take())
        {
            renamed.push(pair(old, new, 100));
        }
    }
}

fn similarity_pass(
    database: &Database,
    deleted: &mut [Option<Side>],
    added: &mut [Option<Side>],
    renamed: &mut Vec<ChangeRecord>,
) -> anyhow::Result<()> {
    let pending_deleted = deleted.iter().flatten().count();
    let pending_added = added.iter().flatten().count();
    if pending_deleted == 0 || pending_added == 0 {
        return Ok(());
    }
    if pending_deleted * pending_added > MAX_RENAME_PAIRS {
        log::warn!(
            "skipping inexact rename detection: {pending_deleted} x {pending_added} candidates"
        );
        return Ok(());
    }

    let old_contents = load_candidates(database, deleted)?;
    let new_contents = load_candidates(database, added)?;

    let mut scores = Vec::new();
    for (&i, old) in &old_contents {
        for (&j, new) in &new_contents {
            let score = similarity(old, new);
            if score >= RENAME_THRESHOLD {
                scores.push((score, i, j));
            }
        }
    }

    // best score first, then earliest paths for stable output
    scores.sort_by(|x, y| y.0.cmp(&x.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

    for (score, i, j) in scores {
        if deleted[i].is_none() || added[j].is_none() {
            continue;
        }
        if let (Some(old), Some(new)) = (deleted[i].take(), added[j].take()) {
            renamed.push(pair(old, new, score));
        }
    }

    Ok(())
}

/// Contents worth scoring, keyed by slot
fn load_candidates(
    database: &Database,
    slots: &[Option<Side>],
) -> anyhow::Result<HashMap<usize, bytes::Bytes>> {
    let mut contents = HashMap::new();

    for (i, slot) in slots.iter().enumerate() {
        let Some((_, entry)) = slot else {
            continue;
        };
        if !entry.mode.is_regular_file() {
            continue;
        }

        let blob = database.load_blob(&entry.oid)?;
        if blob.is_empty() || blob.len() > MAX_SIMILARITY_SIZE {
            continue;
        }
        contents.insert(i, blob.content().clone());
    }

    Ok(contents)
}

/// Percentage of shared line bytes relative to the larger side
pub fn similarity(old: &[u8], new: &[u8]) -> u8 {
    let larger = old.len().max(new.len());
    if larger == 0 {
        return 100;
    }
    // cheap bound: the smaller side cannot share more than its own size
    if old.len().min(new.len()) * 100 < larger * RENAME_THRESHOLD as usize {
        return 0;
    }

    let mut old_lines: HashMap<&[u8], usize> = HashMap::new();
    for line in old.split_inclusive(|&byte| byte == b'\n') {
        *old_lines.entry(line).or_default() += 1;
    }

    let mut common = 0;
    for line in new.split_inclusive(|&byte| byte == b'\n') {
        if let Some(count) = old_lines.get_mut(line)
            && *count > 0
        {
            *count -= 1;
            common += line.len();
        }
    }

    (common * 100 / larger) as u8
}
