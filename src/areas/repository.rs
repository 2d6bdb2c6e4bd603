use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::errors::CommitToError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const GIT_DIR: &str = ".git";
const GITDIR_PREFIX: &str = "gitdir:";

pub struct Repository {
    work_tree: Box<Path>,
    /// Per-worktree git directory (HEAD, index)
    git_dir: Box<Path>,
    /// Shared git directory (objects, refs, config, hooks)
    common_dir: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: Arc<Mutex<Index>>,
    database: Database,
    refs: Refs,
}

impl Repository {
    /// Open the repository containing `start`, searching parent directories
    pub fn discover(start: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .with_context(|| format!("unable to resolve {}", start.display()))?;

        let work_tree = start
            .ancestors()
            .find(|dir| dir.join(GIT_DIR).exists())
            .ok_or_else(|| CommitToError::NotARepository(start.clone()))?
            .to_path_buf();

        let git_dir = Self::resolve_git_dir(&work_tree)?;
        let common_dir = Self::resolve_common_dir(&git_dir)?;

        if !common_dir.join("objects").is_dir() {
            return Err(CommitToError::NotARepository(work_tree).into());
        }

        log::debug!(
            "repository at {} (git dir {})",
            work_tree.display(),
            git_dir.display()
        );

        Ok(Repository {
            index: Arc::new(Mutex::new(Index::new(
                git_dir.join("index").into_boxed_path(),
            ))),
            database: Database::new(common_dir.join("objects").into_boxed_path()),
            refs: Refs::new(
                common_dir.clone().into_boxed_path(),
                git_dir.clone().into_boxed_path(),
            ),
            work_tree: work_tree.into_boxed_path(),
            git_dir: git_dir.into_boxed_path(),
            common_dir: common_dir.into_boxed_path(),
            writer: RefCell::new(writer),
        })
    }

    /// `.git` is a directory, or a file pointing at one (linked worktrees,
    /// submodules)
    fn resolve_git_dir(work_tree: &Path) -> anyhow::Result<PathBuf> {
        let dot_git = work_tree.join(GIT_DIR);
        if dot_git.is_dir() {
            return Ok(dot_git);
        }

        let content = std::fs::read_to_string(&dot_git)
            .with_context(|| format!("unable to read {}", dot_git.display()))?;
        let target = content
            .trim()
            .strip_prefix(GITDIR_PREFIX)
            .ok_or_else(|| CommitToError::NotARepository(work_tree.to_path_buf()))?
            .trim();

        Ok(work_tree.join(target))
    }

    fn resolve_common_dir(git_dir: &Path) -> anyhow::Result<PathBuf> {
        let commondir_file = git_dir.join("commondir");
        if !commondir_file.is_file() {
            return Ok(git_dir.to_path_buf());
        }

        let content = std::fs::read_to_string(&commondir_file)
            .with_context(|| format!("unable to read {}", commondir_file.display()))?;
        Ok(git_dir.join(content.trim()))
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn common_dir(&self) -> &Path {
        &self.common_dir
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }
}
