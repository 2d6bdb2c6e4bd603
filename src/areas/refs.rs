//! Git references (branches and HEAD)
//!
//! References are text files holding either a 40-character object id or
//! `ref: <name>` for symbolic references. Branches missing as loose files
//! are looked up in `packed-refs`.
//!
//! ## Updates
//!
//! A branch only ever moves through [`Refs::compare_and_swap`], which takes
//! git's `<ref>.lock` file, re-reads the current value under it and refuses to
//! proceed if the branch is no longer where the caller last saw it.

use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::signature::Signature;
use crate::errors::CommitToError;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::fs::File;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

const PACKED_REFS: &str = "packed-refs";
const LOCK_SUFFIX: &str = ".lock";

/// Symbolic references are followed at most this deep
const MAX_SYMREF_DEPTH: usize = 5;

#[derive(Debug, new)]
pub struct Refs {
    /// Directory holding branches, `packed-refs` and their logs
    path: Box<Path>,
    /// Directory holding `HEAD`; differs from `path` in linked worktrees
    head_dir: Box<Path>,
}

#[derive(Debug, Clone)]
enum SymRefOrOid {
    SymRef { sym_ref_name: SymRefName },
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ref file at {}", path.display()))?;
        Self::parse(content.trim())
            .with_context(|| format!("invalid ref file at {}", path.display()))
    }

    fn parse(content: &str) -> anyhow::Result<Option<SymRefOrOid>> {
        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        match symref_match {
            Some(symref_match) => Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: SymRefName::new(symref_match[1].to_string()),
            })),
            None => Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(content)?))),
        }
    }
}

/// A `<ref>.lock` file owned by this process
///
/// Dropping it without [`LockFile::commit`] removes the lock and leaves the
/// reference untouched.
#[derive(Debug)]
struct LockFile {
    target: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
}

impl LockFile {
    fn acquire(target: &Path) -> std::io::Result<Self> {
        let mut lock_path = target.as_os_str().to_owned();
        lock_path.push(LOCK_SUFFIX);
        let lock_path = PathBuf::from(lock_path);

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)?;

        Ok(LockFile {
            target: target.to_path_buf(),
            lock_path,
            file: Some(file),
        })
    }

    fn commit(mut self, content: &str) -> anyhow::Result<()> {
        let mut file = self
            .file
            .take()
            .context("lock file already committed")?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&self.lock_path, &self.target).with_context(|| {
            format!(
                "unable to move {} into place",
                self.lock_path.display()
            )
        })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

impl Refs {
    /// File backing a reference
    fn ref_file(&self, sym_ref_name: &SymRefName) -> PathBuf {
        match sym_ref_name.as_ref_path() {
            HEAD_REF_NAME => self.head_path(),
            name => self.path.join(name),
        }
    }

    /// The reference HEAD ultimately points at
    ///
    /// `refs/heads/<branch>` when a branch is checked out (born or not),
    /// `HEAD` itself when detached.
    pub fn current_ref(&self) -> anyhow::Result<SymRefName> {
        let mut source = SymRefName::new(HEAD_REF_NAME.to_string());

        for _ in 0..MAX_SYMREF_DEPTH {
            match SymRefOrOid::read_symref_or_oid(&self.ref_file(&source))? {
                Some(SymRefOrOid::SymRef { sym_ref_name }) => source = sym_ref_name,
                Some(SymRefOrOid::Oid(_)) | None => return Ok(source),
            }
        }

        anyhow::bail!("symbolic reference chain from HEAD is too deep")
    }

    /// Commit HEAD resolves to; `None` on an unborn branch
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        let current = self.current_ref()?;
        match current.branch_name() {
            Some(_) => self.read_ref(&current),
            None => match SymRefOrOid::read_symref_or_oid(&self.head_path())? {
                Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
                _ => Ok(None),
            },
        }
    }

    /// Tip of a branch, loose ref first, then `packed-refs`
    pub fn read_branch(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        self.read_ref(&branch_name.to_sym_ref_name())
    }

    fn read_ref(&self, sym_ref_name: &SymRefName) -> anyhow::Result<Option<ObjectId>> {
        let ref_path = self.ref_file(sym_ref_name);

        match SymRefOrOid::read_symref_or_oid(&ref_path)? {
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            Some(SymRefOrOid::SymRef { sym_ref_name }) => {
                anyhow::bail!("{} is a symbolic reference to {}", ref_path.display(), sym_ref_name)
            }
            None => self.read_packed_ref(sym_ref_name),
        }
    }

    fn read_packed_ref(&self, sym_ref_name: &SymRefName) -> anyhow::Result<Option<ObjectId>> {
        let packed_path = self.path.join(PACKED_REFS);
        if !packed_path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&packed_path)
            .with_context(|| format!("failed to read {}", packed_path.display()))?;

        for line in content.lines() {
            // comments carry traits, '^' lines are peeled tag targets
            if line.starts_with('#') || line.starts_with('^') {
                continue;
            }
            if let Some((oid, name)) = line.split_once(' ')
                && name == sym_ref_name.as_ref_path()
            {
                return Ok(Some(ObjectId::try_parse(oid)?));
            }
        }

        Ok(None)
    }

    /// Move `branch_name` from `expected` to `new_oid`
    ///
    /// Fails with [`CommitToError::ConcurrentUpdate`] when the branch no longer
    /// points at `expected`, or when another process holds its lock.
    pub fn compare_and_swap(
        &self,
        branch_name: &BranchName,
        expected: &ObjectId,
        new_oid: &ObjectId,
    ) -> anyhow::Result<()> {
        let sym_ref_name = branch_name.to_sym_ref_name();
        let ref_path = self.ref_file(&sym_ref_name);

        if let Some(parent) = ref_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create ref directory {}", parent.display())
            })?;
        }

        let lock = match LockFile::acquire(&ref_path) {
            Ok(lock) => lock,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(CommitToError::ConcurrentUpdate {
                    branch: branch_name.to_string(),
                    expected: expected.to_string(),
                    actual: format!("a lock held at {}{LOCK_SUFFIX}", ref_path.display()),
                }
                .into());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("unable to lock {}", ref_path.display())
                });
            }
        };

        let actual = self.read_ref(&sym_ref_name)?;
        if actual.as_ref() != Some(expected) {
            return Err(CommitToError::ConcurrentUpdate {
                branch: branch_name.to_string(),
                expected: expected.to_string(),
                actual: actual.map_or_else(|| "no branch".to_string(), |oid| oid.to_string()),
            }
            .into());
        }

        lock.commit(&format!("{new_oid}\n"))?;
        log::debug!("{sym_ref_name}: {expected} -> {new_oid}");

        Ok(())
    }

    /// Append a line to `.git/logs/<ref>`
    pub fn append_reflog(
        &self,
        sym_ref_name: &SymRefName,
        old_oid: &ObjectId,
        new_oid: &ObjectId,
        committer: &Signature,
        message: &str,
    ) -> anyhow::Result<()> {
        let log_path = match sym_ref_name.as_ref_path() {
            HEAD_REF_NAME => self.head_dir.join("logs").join(HEAD_REF_NAME),
            name => self.path.join("logs").join(name),
        };
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // reflog messages are single-line
        let message = message.lines().next().unwrap_or_default();
        let line = format!("{old_oid} {new_oid} {}\t{message}\n", committer.display());

        let mut log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("failed to open reflog {}", log_path.display()))?;
        let mut lock = file_guard::lock(&mut log_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(line.as_bytes())?;

        Ok(())
    }

    pub fn head_path(&self) -> PathBuf {
        self.head_dir.join(HEAD_REF_NAME)
    }
}
