//! Data structures and algorithms
//!
//! This module contains the building blocks the `commit-to` pipeline is made of:
//!
//! - `branch`: branch and reference names
//! - `builder`: commit construction, identities, message cleanup and signing
//! - `composer`: replaying staged changes onto another tree
//! - `database`: tree entry representation
//! - `diff`: line diffs for the verbose message template
//! - `external`: editor, signer and hook processes
//! - `index`: index file format
//! - `objects`: blobs, trees, commits and their identifiers
//! - `settings`: configuration resolved once per invocation
//! - `staging`: staged change extraction and rename detection

pub mod branch;
pub mod builder;
pub mod composer;
pub mod database;
pub mod diff;
pub mod external;
pub mod index;
pub mod objects;
pub mod settings;
pub mod staging;
