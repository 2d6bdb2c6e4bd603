//! Staged change extraction
//!
//! - `change_record`: one path-level change between HEAD and the index
//! - `extractor`: computes the ordered change list
//! - `renames`: pairs deletions with additions

pub mod change_record;
pub mod extractor;
pub mod renames;
