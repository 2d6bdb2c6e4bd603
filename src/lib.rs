//! Commit staged changes onto a branch other than the checked-out one.
//!
//! The staged diff (index vs. `HEAD`) is replayed onto the tip tree of the
//! target branch, a new commit is written with the previous tip as its only
//! parent, and the branch is advanced with a compare-and-set. The working
//! directory and the index are never modified.
//!
//! - `areas`: on-disk repository areas (objects, index, refs, config, hooks)
//! - `artifacts`: data structures and the extract / compose / build pipeline
//! - `commands`: the user-facing command
//! - `errors`: the fatal condition taxonomy

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
