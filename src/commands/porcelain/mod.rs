//! User-facing commands
//!
//! - `commit_to`: commit the staged changes onto another branch

pub mod commit_to;
