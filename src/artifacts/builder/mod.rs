//! Commit construction and branch advancement
//!
//! A commit always has exactly one parent: the tip the target branch had when
//! the command started. Unsigned commits are written locally. Signed commits
//! are produced by an external signer, then read back from the object
//! database and checked against what was asked for.

pub mod identity;
pub mod message;
pub mod signing;

use crate::areas::database::Database;
use crate::areas::refs::{HEAD_REF_NAME, Refs};
use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::builder::signing::{Signing, SigningRequest};
use crate::artifacts::external::ExternalTools;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::CommitToError;
use derive_new::new;

#[derive(new)]
pub struct CommitBuilder<'r, T: ExternalTools> {
    database: &'r Database,
    refs: &'r Refs,
    tools: &'r T,
}

impl<T: ExternalTools> CommitBuilder<'_, T> {
    /// Write the commit described by `request`
    pub async fn create_commit(
        &self,
        request: SigningRequest,
        signing: &Signing,
    ) -> anyhow::Result<(ObjectId, Commit)> {
        if !signing.is_enabled() {
            let commit = request.unsigned_commit();
            let commit_oid = self.database.store(&commit)?;
            log::debug!("wrote commit {commit_oid}");
            return Ok((commit_oid, commit));
        }

        let commit_oid = self.tools.sign(&request).await?;
        let commit = self.database.load_commit(&commit_oid).map_err(|err| {
            CommitToError::SigningFailed(format!(
                "signed commit {commit_oid} is unreadable: {err:#}"
            ))
        })?;

        if commit.tree_oid() != &request.tree_oid || commit.parents() != [request.parent] {
            return Err(CommitToError::SigningFailed(format!(
                "signed commit {commit_oid} does not match the requested tree and parent"
            ))
            .into());
        }
        log::debug!("signer wrote commit {commit_oid}");

        Ok((commit_oid, commit))
    }

    /// Move `branch` from `parent` to `commit_oid` and record it in the reflogs
    ///
    /// Once the branch has moved the commit is made, so reflog failures are
    /// only reported.
    pub fn advance_branch(
        &self,
        branch: &BranchName,
        parent: &ObjectId,
        commit_oid: &ObjectId,
        commit: &Commit,
    ) -> anyhow::Result<()> {
        self.refs.compare_and_swap(branch, parent, commit_oid)?;

        let message = format!("commit: {}", commit.short_message());
        let sym_ref_name = branch.to_sym_ref_name();
        let mut reflogs = vec![sym_ref_name.clone()];

        // HEAD has its own reflog when the target is the checked-out branch
        match self.refs.current_ref() {
            Ok(current) if current == sym_ref_name => {
                reflogs.push(SymRefName::new(HEAD_REF_NAME.to_string()));
            }
            Ok(_) => {}
            Err(err) => log::warn!("unable to resolve HEAD for its reflog: {err:#}"),
        }

        for reflog in &reflogs {
            if let Err(err) =
                self.refs
                    .append_reflog(reflog, parent, commit_oid, commit.committer(), &message)
            {
                log::warn!("unable to update the reflog of {reflog}: {err:#}");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object::Object;
    use crate::artifacts::objects::signature::Signature;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::cell::RefCell;
    use std::path::Path;

    /// Signs by storing the unsigned commit, or by storing a bogus one
    struct StubSigner<'d> {
        database: &'d Database,
        forge_tree: bool,
        requests: RefCell<Vec<SigningRequest>>,
    }

    impl ExternalTools for StubSigner<'_> {
        async fn edit_message(&self, _path: &Path) -> anyhow::Result<()> {
            unreachable!("the builder never edits messages")
        }

        async fn sign(&self, request: &SigningRequest) -> anyhow::Result<ObjectId> {
            self.requests.borrow_mut().push(request.clone());
            let mut commit = request.clone();
            if self.forge_tree {
                commit.tree_oid = commit.parent;
            }
            self.database.store(&commit.unsigned_commit())
        }

        async fn run_hook(&self, _hook: &Path, _args: &[&Path]) -> anyhow::Result<()> {
            unreachable!("the builder never runs hooks")
        }
    }

    struct Repo {
        dir: TempDir,
        database: Database,
        refs: Refs,
    }

    #[fixture]
    fn repo() -> Repo {
        let dir = TempDir::new().unwrap();
        let git_dir = dir.path().join(".git");
        std::fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
        std::fs::write(git_dir.join("HEAD"), "ref: refs/heads/feature\n").unwrap();
        let database = Database::new(git_dir.join("objects").into_boxed_path());
        let refs = Refs::new(
            git_dir.clone().into_boxed_path(),
            git_dir.into_boxed_path(),
        );
        Repo {
            dir,
            database,
            refs,
        }
    }

    fn request(parent: ObjectId) -> SigningRequest {
        let signature =
            Signature::try_from("Ada Lovelace <ada@example.com> 1672574400 +0000").unwrap();
        SigningRequest {
            tree_oid: ObjectId::try_parse("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap(),
            parent,
            author: signature.clone(),
            committer: signature,
            message: "add feature\n\nwith a body\n".to_string(),
            key: None,
        }
    }

    fn stub(database: &Database, forge_tree: bool) -> StubSigner<'_> {
        StubSigner {
            database,
            forge_tree,
            requests: RefCell::new(Vec::new()),
        }
    }

    fn set_branch(repo: &Repo, name: &str, oid: &ObjectId) {
        std::fs::write(
            repo.dir.path().join(".git/refs/heads").join(name),
            format!("{oid}\n"),
        )
        .unwrap();
    }

    #[rstest]
    #[tokio::test]
    async fn unsigned_commits_are_written_locally(repo: Repo) {
        let parent = ObjectId::try_parse(&"1".repeat(40)).unwrap();
        let tools = stub(&repo.database, false);
        let builder = CommitBuilder::new(&repo.database, &repo.refs, &tools);

        let (commit_oid, commit) = builder
            .create_commit(request(parent), &Signing::Disabled)
            .await
            .unwrap();

        assert!(tools.requests.borrow().is_empty());
        assert_eq!(repo.database.load_commit(&commit_oid).unwrap(), commit);
        assert_eq!(commit.parents(), &[parent]);
    }

    #[rstest]
    #[tokio::test]
    async fn signed_commits_come_from_the_signer(repo: Repo) {
        let parent = ObjectId::try_parse(&"1".repeat(40)).unwrap();
        let tools = stub(&repo.database, false);
        let builder = CommitBuilder::new(&repo.database, &repo.refs, &tools);
        let expected = request(parent).unsigned_commit().object_id().unwrap();

        let (commit_oid, _) = builder
            .create_commit(request(parent), &Signing::Enabled { key: None })
            .await
            .unwrap();

        assert_eq!(commit_oid, expected);
        assert_eq!(tools.requests.borrow().as_slice(), &[request(parent)]);
    }

    #[rstest]
    #[tokio::test]
    async fn signed_commits_must_match_the_request(repo: Repo) {
        let parent = ObjectId::try_parse(&"1".repeat(40)).unwrap();
        let tools = stub(&repo.database, true);
        let builder = CommitBuilder::new(&repo.database, &repo.refs, &tools);

        let err = builder
            .create_commit(request(parent), &Signing::Enabled { key: None })
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CommitToError>(),
            Some(CommitToError::SigningFailed(_))
        ));
    }

    #[rstest]
    fn advancing_writes_branch_and_head_reflogs(repo: Repo) {
        let parent = ObjectId::try_parse(&"1".repeat(40)).unwrap();
        let tools = stub(&repo.database, false);
        let builder = CommitBuilder::new(&repo.database, &repo.refs, &tools);
        let commit = request(parent).unsigned_commit();
        let commit_oid = commit.object_id().unwrap();
        let branch = BranchName::try_parse("feature").unwrap();
        set_branch(&repo, "feature", &parent);

        builder
            .advance_branch(&branch, &parent, &commit_oid, &commit)
            .unwrap();

        let expected = format!(
            "{parent} {commit_oid} Ada Lovelace <ada@example.com> 1672574400 +0000\tcommit: add feature\n"
        );
        let logs = repo.dir.path().join(".git/logs");
        assert_eq!(repo.refs.read_branch(&branch).unwrap(), Some(commit_oid));
        assert_eq!(
            std::fs::read_to_string(logs.join("refs/heads/feature")).unwrap(),
            expected
        );
        assert_eq!(std::fs::read_to_string(logs.join("HEAD")).unwrap(), expected);
    }

    #[rstest]
    fn other_branches_leave_the_head_reflog_alone(repo: Repo) {
        let parent = ObjectId::try_parse(&"1".repeat(40)).unwrap();
        let tools = stub(&repo.database, false);
        let builder = CommitBuilder::new(&repo.database, &repo.refs, &tools);
        let commit = request(parent).unsigned_commit();
        let commit_oid = commit.object_id().unwrap();
        let branch = BranchName::try_parse("main").unwrap();
        set_branch(&repo, "main", &parent);

        builder
            .advance_branch(&branch, &parent, &commit_oid, &commit)
            .unwrap();

        assert!(repo.dir.path().join(".git/logs/refs/heads/main").is_file());
        assert!(!repo.dir.path().join(".git/logs/HEAD").exists());
    }

    #[rstest]
    fn reflog_failures_do_not_undo_the_commit(repo: Repo) {
        let parent = ObjectId::try_parse(&"1".repeat(40)).unwrap();
        let tools = stub(&repo.database, false);
        let builder = CommitBuilder::new(&repo.database, &repo.refs, &tools);
        let commit = request(parent).unsigned_commit();
        let commit_oid = commit.object_id().unwrap();
        let branch = BranchName::try_parse("feature").unwrap();
        set_branch(&repo, "feature", &parent);
        let logs = repo.dir.path().join(".git/logs");
        std::fs::create_dir_all(logs.join("refs/heads/feature")).unwrap();

        builder
            .advance_branch(&branch, &parent, &commit_oid, &commit)
            .unwrap();

        assert_eq!(repo.refs.read_branch(&branch).unwrap(), Some(commit_oid));
        assert!(logs.join("refs/heads/feature").is_dir());
        assert!(std::fs::read_to_string(logs.join("HEAD"))
            .unwrap()
            .ends_with("\tcommit: add feature\n"));
    }

    #[rstest]
    fn a_moved_branch_is_not_overwritten(repo: Repo) {
        let parent = ObjectId::try_parse(&"1".repeat(40)).unwrap();
        let moved = ObjectId::try_parse(&"2".repeat(40)).unwrap();
        let tools = stub(&repo.database, false);
        let builder = CommitBuilder::new(&repo.database, &repo.refs, &tools);
        let commit = request(parent).unsigned_commit();
        let branch = BranchName::try_parse("main").unwrap();
        set_branch(&repo, "main", &moved);

        let err = builder
            .advance_branch(&branch, &parent, &commit.object_id().unwrap(), &commit)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CommitToError>(),
            Some(CommitToError::ConcurrentUpdate { .. })
        ));
        assert_eq!(repo.refs.read_branch(&branch).unwrap(), Some(moved));
        assert!(!repo.dir.path().join(".git/logs/refs/heads/main").exists());
    }
}
