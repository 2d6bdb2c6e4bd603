use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::OBJECT_ID_BYTES;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::BufRead;
use std::path::PathBuf;

pub trait Packable {
    /// Full loose-object bytes, header included
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    /// Parse an object body; the `<type> <size>\0` header has already been consumed
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        let digest = Sha1::digest(&content);
        let mut bytes = [0u8; OBJECT_ID_BYTES];
        bytes.copy_from_slice(&digest);

        Ok(ObjectId::from_bytes(bytes))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// Prefix an object body with its loose-object header
pub(crate) fn with_header(object_type: ObjectType, body: &[u8]) -> Bytes {
    let mut bytes = format!("{} {}\0", object_type.as_str(), body.len()).into_bytes();
    bytes.extend_from_slice(body);

    Bytes::from(bytes)
}

pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }
}
