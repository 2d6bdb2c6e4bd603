//! Editable view over a persisted tree
//!
//! Directories are only loaded ("materialized") into the arena when an edit
//! reaches into them; every other subtree stays a reference to its existing
//! object and is written back by id. The base tree itself is never touched.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::CommitToError;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

const ROOT: usize = 0;

#[derive(Debug, Clone)]
enum Slot {
    /// Persisted object: a blob, a gitlink, or a subtree nobody edited
    Entry(DatabaseEntry),
    /// Materialized directory in the arena
    Node(usize),
}

#[derive(Debug, Default)]
struct Node {
    entries: BTreeMap<String, Slot>,
}

#[derive(Debug)]
pub struct ScratchTree<'r> {
    database: &'r Database,
    nodes: Vec<Node>,
}

impl<'r> ScratchTree<'r> {
    /// Start from `base`, or from an empty root
    pub fn new(database: &'r Database, base: Option<&ObjectId>) -> anyhow::Result<Self> {
        let mut scratch = ScratchTree {
            database,
            nodes: Vec::new(),
        };
        match base {
            Some(tree_oid) => scratch.materialize(tree_oid)?,
            None => {
                scratch.nodes.push(Node::default());
                ROOT
            }
        };
        Ok(scratch)
    }

    fn materialize(&mut self, tree_oid: &ObjectId) -> anyhow::Result<usize> {
        let tree = self
            .database
            .load_tree(tree_oid)
            .with_context(|| format!("unable to load tree {tree_oid}"))?;

        self.nodes.push(Node {
            entries: tree
                .into_entries()
                .map(|(name, entry)| (name, Slot::Entry(entry)))
                .collect(),
        });
        Ok(self.nodes.len() - 1)
    }

    /// Insert or replace the entry at `path`, creating parent directories
    ///
    /// Fails with [`CommitToError::PathConflict`] when a parent is a file or
    /// when `path` itself is a non-empty directory.
    pub fn upsert(&mut self, path: &Path, entry: DatabaseEntry) -> anyhow::Result<()> {
        let (dirs, name) = split(path)?;
        let mut node = ROOT;
        let mut walked = PathBuf::new();

        for dir in dirs {
            walked.push(&dir);
            node = match self.nodes[node].entries.get(&dir).cloned() {
                Some(Slot::Node(child)) => child,
                Some(Slot::Entry(existing)) if existing.is_tree() => {
                    let child = self.materialize(&existing.oid)?;
                    self.nodes[node].entries.insert(dir, Slot::Node(child));
                    child
                }
                Some(Slot::Entry(_)) => {
                    return Err(CommitToError::PathConflict {
                        path: walked,
                        kind: "file",
                    }
                    .into());
                }
                None => {
                    self.nodes.push(Node::default());
                    let child = self.nodes.len() - 1;
                    self.nodes[node].entries.insert(dir, Slot::Node(child));
                    child
                }
            };
        }

        let occupied_by_directory = match self.nodes[node].entries.get(&name) {
            Some(Slot::Node(child)) => !self.is_empty_node(*child),
            Some(Slot::Entry(existing)) => existing.is_tree(),
            None => false,
        };
        if occupied_by_directory {
            return Err(CommitToError::PathConflict {
                path: path.to_path_buf(),
                kind: "directory",
            }
            .into());
        }

        self.nodes[node].entries.insert(name, Slot::Entry(entry));
        Ok(())
    }

    /// Remove the file at `path`
    ///
    /// Returns `false` without changing anything when `path` does not name a
    /// file in the tree.
    pub fn remove(&mut self, path: &Path) -> anyhow::Result<bool> {
        let (dirs, name) = split(path)?;
        let mut node = ROOT;

        for dir in dirs {
            node = match self.nodes[node].entries.get(&dir).cloned() {
                Some(Slot::Node(child)) => child,
                Some(Slot::Entry(existing)) if existing.is_tree() => {
                    let child = self.materialize(&existing.oid)?;
                    self.nodes[node].entries.insert(dir, Slot::Node(child));
                    child
                }
                _ => return Ok(false),
            };
        }

        match self.nodes[node].entries.get(&name) {
            Some(Slot::Entry(existing)) if !existing.is_tree() => {
                self.nodes[node].entries.remove(&name);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn is_empty_node(&self, node: usize) -> bool {
        self.nodes[node].entries.values().all(|slot| match slot {
            Slot::Node(child) => self.is_empty_node(*child),
            Slot::Entry(_) => false,
        })
    }

    /// Persist every materialized directory and return the root tree id
    ///
    /// Directories left without entries are dropped; the root is always
    /// written, even when empty.
    pub fn write(self) -> anyhow::Result<ObjectId> {
        match self.write_node(ROOT)? {
            Some(oid) => Ok(oid),
            None => self.database.store(&Tree::default()),
        }
    }

    fn write_node(&self, node: usize) -> anyhow::Result<Option<ObjectId>> {
        let mut entries = Vec::new();

        for (name, slot) in &self.nodes[node].entries {
            match slot {
                Slot::Entry(entry) => entries.push((name.clone(), entry.clone())),
                Slot::Node(child) => {
                    if let Some(oid) = self.write_node(*child)? {
                        entries.push((name.clone(), DatabaseEntry::new(oid, EntryMode::Directory)));
                    }
                }
            }
        }

        if entries.is_empty() {
            return Ok(None);
        }

        self.database.store(&Tree::from_entries(entries)).map(Some)
    }
}

/// Parent directory names and the final name of a repository-relative path
fn split(path: &Path) -> anyhow::Result<(Vec<String>, String)> {
    let mut names = path
        .components()
        .map(|component| match component {
            Component::Normal(name) => name
                .to_str()
                .map(str::to_string)
                .with_context(|| format!("path {} is not valid UTF-8", path.display())),
            _ => anyhow::bail!("path {} is not a plain relative path", path.display()),
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let name = names
        .pop()
        .with_context(|| format!("empty path '{}'", path.display()))?;
    Ok((names, name))
}
