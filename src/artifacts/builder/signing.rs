//! Commit signing through an external signer
//!
//! The signer gets the same bytes git would sign: the unsigned commit body.
//! Author and committer are also passed as `GIT_*` variables so a signer that
//! rebuilds the commit itself (like `git commit-tree`) produces the same
//! header lines.

use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::signature::Signature;

/// Whether, and with which key, commits are signed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Signing {
    #[default]
    Disabled,
    /// `key` of `None` lets the signer pick its default key
    Enabled { key: Option<String> },
}

impl Signing {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Signing::Enabled { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub tree_oid: ObjectId,
    pub parent: ObjectId,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
    pub key: Option<String>,
}

impl SigningRequest {
    /// The commit this request describes, without a signature
    pub fn unsigned_commit(&self) -> Commit {
        Commit::new(
            self.tree_oid,
            vec![self.parent],
            self.author.clone(),
            self.committer.clone(),
            self.message.clone(),
        )
    }

    pub fn environment(&self) -> Vec<(String, String)> {
        vec![
            ("GIT_AUTHOR_NAME".into(), self.author.name().into()),
            ("GIT_AUTHOR_EMAIL".into(), self.author.email().into()),
            ("GIT_AUTHOR_DATE".into(), self.author.raw_date()),
            ("GIT_COMMITTER_NAME".into(), self.committer.name().into()),
            ("GIT_COMMITTER_EMAIL".into(), self.committer.email().into()),
            ("GIT_COMMITTER_DATE".into(), self.committer.raw_date()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::collections::HashMap;

    #[fixture]
    fn request() -> SigningRequest {
        SigningRequest {
            tree_oid: ObjectId::try_parse("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap(),
            parent: ObjectId::try_parse(&"1".repeat(40)).unwrap(),
            author: Signature::try_from("Ada Lovelace <ada@example.com> 1672574400 +0130").unwrap(),
            committer: Signature::try_from("Charles Babbage <cb@example.com> 1672578000 -0800")
                .unwrap(),
            message: "add feature\n".to_string(),
            key: Some("ABCDEF".to_string()),
        }
    }

    #[rstest]
    fn environment_reproduces_the_payload_identity_lines(request: SigningRequest) {
        let env = request.environment().into_iter().collect::<HashMap<_, _>>();
        let payload = String::from_utf8(request.unsigned_commit().payload().to_vec()).unwrap();

        let author_line = format!(
            "author {} <{}> {}",
            env["GIT_AUTHOR_NAME"], env["GIT_AUTHOR_EMAIL"], env["GIT_AUTHOR_DATE"]
        );
        let committer_line = format!(
            "committer {} <{}> {}",
            env["GIT_COMMITTER_NAME"], env["GIT_COMMITTER_EMAIL"], env["GIT_COMMITTER_DATE"]
        );

        assert!(payload.lines().any(|line| line == author_line));
        assert!(payload.lines().any(|line| line == committer_line));
        assert_eq!(env["GIT_COMMITTER_DATE"], "1672578000 -0800");
    }

    #[rstest]
    fn payload_has_a_single_parent(request: SigningRequest) {
        let payload = String::from_utf8(request.unsigned_commit().payload().to_vec()).unwrap();

        assert_eq!(
            payload.lines().filter(|line| line.starts_with("parent ")).count(),
            1
        );
        assert!(payload.ends_with("\n\nadd feature\n"));
    }
}
