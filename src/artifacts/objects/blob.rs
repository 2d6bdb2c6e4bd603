//! Git blob object
//!
//! Blobs store raw file content, without name or mode (those live in trees
//! and index entries). On disk: `blob <size>\0<content>`.

use crate::artifacts::objects::object::{Object, Packable, Unpackable, with_header};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

/// Number of leading bytes inspected when deciding whether content is binary
const BINARY_PROBE_SIZE: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Same heuristic as git: a NUL byte near the start marks binary content
    pub fn is_binary(&self) -> bool {
        self.content
            .iter()
            .take(BINARY_PROBE_SIZE)
            .any(|&byte| byte == 0)
    }

    /// Content split into lines, each keeping its trailing `\n`
    pub fn lines(&self) -> Vec<&[u8]> {
        self.content.split_inclusive(|&byte| byte == b'\n').collect()
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(with_header(self.object_type(), &self.content))
    }
}

impl Unpackable for Blob {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::new(content.into()))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }
}
