//! Git commit object
//!
//! ## Format
//!
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//! gpgsig -----BEGIN PGP SIGNATURE-----
//!  <continuation lines start with a space>
//!
//! <commit message>
//! ```
//!
//! Headers other than tree/parent/author/committer (signatures, encoding) are
//! kept verbatim so commits written by an external signer parse cleanly.

use crate::artifacts::objects::object::{Object, Packable, Unpackable, with_header};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use anyhow::Context;
use bytes::Bytes;
use std::io::BufRead;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    tree_oid: ObjectId,
    parents: Vec<ObjectId>,
    author: Signature,
    committer: Signature,
    extra_headers: Vec<(String, String)>,
    message: String,
}

impl Commit {
    pub fn new(
        tree_oid: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: String,
    ) -> Self {
        Commit {
            tree_oid,
            parents,
            author,
            committer,
            extra_headers: Vec::new(),
            message,
        }
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Value of an extra header such as `gpgsig`
    pub fn header(&self, name: &str) -> Option<&str> {
        self.extra_headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First line of the message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    /// Object body without the loose-object header
    ///
    /// For an unsigned commit this is exactly the payload a detached signer signs.
    pub fn payload(&self) -> Bytes {
        let mut body = String::new();

        body.push_str(&format!("tree {}\n", self.tree_oid));
        for parent in &self.parents {
            body.push_str(&format!("parent {parent}\n"));
        }
        body.push_str(&format!("author {}\n", self.author.display()));
        body.push_str(&format!("committer {}\n", self.committer.display()));
        for (key, value) in &self.extra_headers {
            body.push_str(&format!("{key} {}\n", value.replace('\n', "\n ")));
        }
        body.push('\n');
        body.push_str(&self.message);

        Bytes::from(body)
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(with_header(self.object_type(), &self.payload()))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8(content).context("commit object is not valid UTF-8")?;

        let (header_block, message) = match content.split_once("\n\n") {
            Some((headers, message)) => (headers, message.to_string()),
            None => (content.trim_end_matches('\n'), String::new()),
        };

        // fold continuation lines (leading space) into the previous header
        let mut headers: Vec<(String, String)> = Vec::new();
        for line in header_block.lines() {
            if let Some(continuation) = line.strip_prefix(' ') {
                let (_, value) = headers
                    .last_mut()
                    .context("invalid commit object: continuation without header")?;
                value.push('\n');
                value.push_str(continuation);
            } else {
                let (key, value) = line
                    .split_once(' ')
                    .with_context(|| format!("invalid commit header line '{line}'"))?;
                headers.push((key.to_string(), value.to_string()));
            }
        }

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut extra_headers = Vec::new();

        for (key, value) in headers {
            match key.as_str() {
                "tree" => tree_oid = Some(ObjectId::try_parse(&value)?),
                "parent" => parents.push(ObjectId::try_parse(&value)?),
                "author" => author = Some(Signature::try_from(value.as_str())?),
                "committer" => committer = Some(Signature::try_from(value.as_str())?),
                _ => extra_headers.push((key, value)),
            }
        }

        Ok(Commit {
            tree_oid: tree_oid.context("invalid commit object: missing tree")?,
            parents,
            author: author.context("invalid commit object: missing author")?,
            committer: committer.context("invalid commit object: missing committer")?,
            extra_headers,
            message,
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}
