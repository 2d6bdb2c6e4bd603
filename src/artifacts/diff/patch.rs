//! Unified diff rendering for staged changes
//!
//! Output follows `git diff --cached`: `diff --git` headers, mode and
//! rename lines, an `index` line, then hunks with three lines of context.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::myers::{Edit, EditKind, MyersDiff};
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::staging::change_record::{ChangeKind, ChangeRecord};
use bytes::Bytes;
use std::fmt::Write;

/// Unchanged lines shown around every change
pub const HUNK_CONTEXT: usize = 3;

const NULL_PATH: &str = "/dev/null";
const NO_NEWLINE: &str = "\\ No newline at end of file";

/// A contiguous run of edits plus surrounding context
#[derive(Debug)]
pub struct Hunk<'e, 'd, T> {
    pub a_start: usize,
    pub a_len: usize,
    pub b_start: usize,
    pub b_len: usize,
    pub edits: &'e [Edit<'d, T>],
}

impl<T> Hunk<'_, '_, T> {
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            Self::range(self.a_start, self.a_len),
            Self::range(self.b_start, self.b_len)
        )
    }

    fn range(start: usize, len: usize) -> String {
        if len == 1 {
            start.to_string()
        } else {
            format!("{start},{len}")
        }
    }
}

/// Group an edit script into hunks
///
/// Changes separated by at most twice the context share a hunk.
pub fn hunks<'e, 'd, T>(edits: &'e [Edit<'d, T>]) -> Vec<Hunk<'e, 'd, T>> {
    let mut hunks = Vec::new();
    let mut i = 0;

    while i < edits.len() {
        while i < edits.len() && edits[i].is_equal() {
            i += 1;
        }
        if i == edits.len() {
            break;
        }

        let start = i.saturating_sub(HUNK_CONTEXT);
        let mut end;
        let mut j = i;
        loop {
            while j < edits.len() && !edits[j].is_equal() {
                j += 1;
            }
            end = j;

            let mut k = j;
            while k < edits.len() && edits[k].is_equal() {
                k += 1;
            }
            if k < edits.len() && k - j <= 2 * HUNK_CONTEXT {
                j = k;
            } else {
                break;
            }
        }
        let stop = (end + HUNK_CONTEXT).min(edits.len());

        hunks.push(build_hunk(&edits[start..stop]));
        i = stop;
    }

    hunks
}

fn build_hunk<'e, 'd, T>(edits: &'e [Edit<'d, T>]) -> Hunk<'e, 'd, T> {
    let a_len = edits
        .iter()
        .filter(|edit| edit.kind != EditKind::Insert)
        .count();
    let b_len = edits
        .iter()
        .filter(|edit| edit.kind != EditKind::Delete)
        .count();
    let (first_a, first_b) = edits.first().map_or((0, 0), |edit| (edit.a, edit.b));

    Hunk {
        a_start: if a_len == 0 { first_a } else { first_a + 1 },
        a_len,
        b_start: if b_len == 0 { first_b } else { first_b + 1 },
        b_len,
        edits,
    }
}

/// Render the staged changes as one patch
pub fn render_patch(database: &Database, records: &[ChangeRecord]) -> anyhow::Result<String> {
    let mut patch = String::new();

    for record in records {
        render_record(database, record, &mut patch)?;
    }

    Ok(patch)
}

fn render_record(
    database: &Database,
    record: &ChangeRecord,
    patch: &mut String,
) -> anyhow::Result<()> {
    let a_path = record.source_path().display().to_string();
    let b_path = record.path().display().to_string();
    let old = record.old().cloned();
    let new = record.new_entry();

    writeln!(patch, "diff --git a/{a_path} b/{b_path}")?;

    match (&old, &new) {
        (None, Some(new)) => writeln!(patch, "new file mode {}", new.mode)?,
        (Some(old), None) => writeln!(patch, "deleted file mode {}", old.mode)?,
        (Some(old), Some(new)) if old.mode.canonical() != new.mode.canonical() => {
            writeln!(patch, "old mode {}", old.mode)?;
            writeln!(patch, "new mode {}", new.mode)?;
        }
        _ => {}
    }

    if record.kind() == ChangeKind::Renamed {
        writeln!(patch, "similarity index {}%", record.similarity().unwrap_or(100))?;
        writeln!(patch, "rename from {a_path}")?;
        writeln!(patch, "rename to {b_path}")?;
    }

    let old_oid = old.as_ref().map(|entry| entry.oid);
    let new_oid = new.as_ref().map(|entry| entry.oid);
    if old_oid == new_oid {
        // pure rename or mode change
        return Ok(());
    }

    let short = |oid: Option<ObjectId>| oid.unwrap_or_else(ObjectId::zero).to_short_oid();
    match (&old, &new) {
        (Some(old), Some(new)) if old.mode.canonical() == new.mode.canonical() => writeln!(
            patch,
            "index {}..{} {}",
            short(old_oid),
            short(new_oid),
            new.mode
        )?,
        _ => writeln!(patch, "index {}..{}", short(old_oid), short(new_oid))?,
    }

    let a_label = old
        .as_ref()
        .map_or(NULL_PATH.to_string(), |_| format!("a/{a_path}"));
    let b_label = new
        .as_ref()
        .map_or(NULL_PATH.to_string(), |_| format!("b/{b_path}"));

    let a_blob = load_side(database, old.as_ref())?;
    let b_blob = load_side(database, new.as_ref())?;

    if a_blob.is_binary() || b_blob.is_binary() {
        writeln!(patch, "Binary files {a_label} and {b_label} differ")?;
        return Ok(());
    }

    writeln!(patch, "--- {a_label}")?;
    writeln!(patch, "+++ {b_label}")?;

    let a_lines = a_blob.lines();
    let b_lines = b_blob.lines();
    let edits = MyersDiff::new(&a_lines, &b_lines).diff();

    for hunk in hunks(&edits) {
        writeln!(patch, "{}", hunk.header())?;
        for edit in hunk.edits {
            let sign = match edit.kind {
                EditKind::Equal => ' ',
                EditKind::Delete => '-',
                EditKind::Insert => '+',
            };
            let line = String::from_utf8_lossy(edit.value);
            patch.push(sign);
            patch.push_str(&line);
            if !line.ends_with('\n') {
                patch.push('\n');
                writeln!(patch, "{NO_NEWLINE}")?;
            }
        }
    }

    Ok(())
}

/// Content of one side; gitlinks render as their commit id like git does
fn load_side(database: &Database, entry: Option<&DatabaseEntry>) -> anyhow::Result<Blob> {
    match entry {
        None => Ok(Blob::new(Bytes::new())),
        Some(entry) if entry.mode == EntryMode::Gitlink => Ok(Blob::new(Bytes::from(format!(
            "Subproject commit {}\n",
            entry.oid
        )))),
        Some(entry) => database.load_blob(&entry.oid),
    }
}
