//! Repository hooks
//!
//! Hooks live in `core.hooksPath` when configured, `.git/hooks` otherwise.
//! Only regular, executable files are run; anything else is skipped.

use is_executable::IsExecutable;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookName {
    CommitMsg,
    PostCommit,
}

impl HookName {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::CommitMsg => "commit-msg",
            HookName::PostCommit => "post-commit",
        }
    }
}

impl std::fmt::Display for HookName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Hooks {
    path: PathBuf,
}

impl Hooks {
    pub fn new(path: PathBuf) -> Self {
        Hooks { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Executable hook script for `name`, if one is installed
    pub fn find(&self, name: HookName) -> Option<PathBuf> {
        let hook_path = self.path.join(name.as_str());

        if !hook_path.is_file() {
            return None;
        }

        if !hook_path.is_executable() {
            log::warn!(
                "the '{name}' hook was ignored because it's not set as executable ({})",
                hook_path.display()
            );
            return None;
        }

        Some(hook_path)
    }
}
