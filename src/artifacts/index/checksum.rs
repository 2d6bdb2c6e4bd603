//! SHA-1 trailer handling for the index file
//!
//! Every byte read or written passes through the running digest; the last 20
//! bytes of the file must equal the digest of everything before them.

use crate::artifacts::index::CHECKSUM_SIZE;
use anyhow::anyhow;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::Read;

#[derive(Debug)]
pub struct Checksum<F> {
    file: F,
    digest: Sha1,
}

impl<F> Checksum<F> {
    pub fn new(file: F) -> Self {
        Checksum {
            file,
            digest: Sha1::new(),
        }
    }
}

impl<F: Read> Checksum<F> {
    pub fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.file
            .read_exact(&mut buffer)
            .map_err(|_| anyhow!("unexpected end-of-file while reading index"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    /// Consume the rest of the file, feeding everything but the trailer into
    /// the digest, and compare the trailer against it
    ///
    /// Extensions sit between the last entry and the trailer, so this covers
    /// them without having to understand their content.
    pub fn verify_rest(&mut self) -> anyhow::Result<()> {
        let mut rest = Vec::new();
        self.file.read_to_end(&mut rest)?;

        if rest.len() < CHECKSUM_SIZE {
            return Err(anyhow!("index file is truncated: missing checksum"));
        }

        let (extensions, expected) = rest.split_at(rest.len() - CHECKSUM_SIZE);
        self.digest.update(extensions);

        let actual = self.digest.clone().finalize();
        if expected != actual.as_slice() {
            return Err(anyhow!("index checksum does not match value stored on disk"));
        }

        Ok(())
    }
}

#[cfg(test)]
impl<F: std::io::Write> Checksum<F> {
    pub fn into_inner(self) -> F {
        self.file
    }

    pub fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.file.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    pub fn write_checksum(&mut self) -> anyhow::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.file
            .write_all(checksum.as_slice())
            .map_err(|_| anyhow!("failed to write checksum to index file"))?;

        Ok(())
    }
}
