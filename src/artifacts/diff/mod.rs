//! Line diffs for the verbose commit message template
//!
//! - `myers`: Myers' shortest edit script
//! - `patch`: hunks and unified patch rendering for staged changes

pub mod myers;
pub mod patch;
