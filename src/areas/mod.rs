//! On-disk repository areas
//!
//! - `config`: git configuration files
//! - `database`: loose object store for blobs, trees and commits
//! - `hooks`: hook script lookup
//! - `index`: staging area
//! - `refs`: branches, HEAD, reflogs
//! - `repository`: discovery and ownership of the areas above

pub mod config;
pub mod database;
pub mod hooks;
pub mod index;
pub mod refs;
pub mod repository;
