//! Git object identifier (SHA-1 hash)
//!
//! Object IDs are 20-byte SHA-1 digests, rendered as 40 lowercase hex
//! characters. Loose objects live at `.git/objects/<first-2-chars>/<rest>`.

use crate::artifacts::objects::{OBJECT_ID_BYTES, OBJECT_ID_LENGTH, SHORT_OBJECT_ID_LENGTH};
use std::io;
use std::path::PathBuf;

/// Git object identifier
///
/// Stored as raw digest bytes; `Display` renders the full hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_BYTES]);

impl ObjectId {
    /// Parse a full 40-character hexadecimal object ID
    pub fn try_parse(id: &str) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            anyhow::bail!("invalid object ID length {}: '{}'", id.len(), id);
        }

        let mut bytes = [0u8; OBJECT_ID_BYTES];
        hex::decode_to_slice(id, &mut bytes)
            .map_err(|_| anyhow::anyhow!("invalid object ID characters: '{}'", id))?;

        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; OBJECT_ID_BYTES]) -> Self {
        Self(bytes)
    }

    /// The all-zero ID git uses for "no object" (e.g. in reflogs)
    pub fn zero() -> Self {
        Self([0u8; OBJECT_ID_BYTES])
    }

    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_BYTES] {
        &self.0
    }

    /// Write the binary form (20 bytes), as used inside tree objects and the index
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.0)
    }

    /// Read the binary form (20 bytes)
    pub fn read_from<R: io::Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; OBJECT_ID_BYTES];
        reader.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Loose object location relative to the objects directory: `ab/cdef...`
    pub fn to_path(&self) -> PathBuf {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }

    pub fn to_short_oid(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_OBJECT_ID_LENGTH);
        hex
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl std::str::FromStr for ObjectId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    #[test]
    fn parses_and_renders_hex() {
        let oid = ObjectId::try_parse(EMPTY_TREE).unwrap();

        assert_eq!(oid.to_string(), EMPTY_TREE);
        assert_eq!(oid.to_short_oid(), "4b825dc");
        assert_eq!(
            oid.to_path(),
            PathBuf::from("4b").join("825dc642cb6eb9a060e54bf8d69288fbee4904")
        );
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(ObjectId::try_parse("4b825dc").is_err());
        assert!(ObjectId::try_parse(&"z".repeat(40)).is_err());
    }

    #[test]
    fn binary_form_is_twenty_bytes() {
        let oid = ObjectId::try_parse(EMPTY_TREE).unwrap();
        let mut buffer = Vec::new();
        oid.write_to(&mut buffer).unwrap();

        assert_eq!(buffer.len(), OBJECT_ID_BYTES);
        assert_eq!(ObjectId::read_from(&mut buffer.as_slice()).unwrap(), oid);
    }
}
