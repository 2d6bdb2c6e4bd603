//! Fatal conditions of a `commit-to` invocation
//!
//! Every variant is terminal: the process reports it on standard error and
//! exits non-zero. Plumbing code propagates `anyhow::Error`; these variants are
//! raised inside it so callers can `downcast_ref` to the condition.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CommitToError {
    #[error("{0}")]
    Usage(String),

    #[error("not a git repository (or any of the parent directories): {0}")]
    NotARepository(PathBuf),

    #[error("branch '{0}' not found")]
    BranchNotFound(String),

    #[error("unable to resolve {role} identity: {reason}")]
    IdentityUnresolved { role: &'static str, reason: String },

    #[error("aborting commit due to empty commit message")]
    EmptyMessage,

    #[error("there was a problem with the editor '{editor}': {reason}")]
    EditorFailed { editor: String, reason: String },

    #[error("{hook} hook failed: {reason}")]
    HookFailed { hook: String, reason: String },

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("branch '{branch}' was updated concurrently (expected {expected}, found {actual})")]
    ConcurrentUpdate {
        branch: String,
        expected: String,
        actual: String,
    },

    #[error("unable to start '{program}'")]
    ExternalProcessUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("staged path '{}' is no longer present in the index", .0.display())]
    StaleIndexEntry(PathBuf),

    #[error("path '{}' conflicts with an existing {kind} on the target branch", .path.display())]
    PathConflict { path: PathBuf, kind: &'static str },

    #[error("cannot commit: '{}' has unmerged entries in the index", .0.display())]
    UnmergedEntry(PathBuf),
}
