use crate::areas::hooks::{HookName, Hooks};
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::builder::CommitBuilder;
use crate::artifacts::builder::identity::{self, Role};
use crate::artifacts::builder::message::{self, MessageTemplate};
use crate::artifacts::builder::signing::{Signing, SigningRequest};
use crate::artifacts::composer::TreeComposer;
use crate::artifacts::diff::patch::render_patch;
use crate::artifacts::external::ExternalTools;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::settings::CommitSettings;
use crate::artifacts::staging::change_record::ChangeRecord;
use crate::artifacts::staging::extractor::ChangeExtractor;
use crate::errors::CommitToError;
use anyhow::Context;
use colored::Colorize;
use std::io::Write;

const COMMIT_EDITMSG: &str = "COMMIT_EDITMSG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitToOptions {
    pub branch: String,
    /// `-m`; skips the editor
    pub message: Option<String>,
    pub dry_run: bool,
    /// Skip the commit-msg hook
    pub no_verify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitToOutcome {
    NothingToCommit,
    DryRun,
    Committed {
        commit_oid: ObjectId,
        parent: ObjectId,
    },
}

impl Repository {
    /// Commit the staged changes onto `options.branch`
    ///
    /// The staged diff is taken against HEAD and replayed onto the target
    /// branch's tip. Neither the index nor the working tree is modified.
    pub async fn commit_to<T: ExternalTools>(
        &self,
        options: &CommitToOptions,
        settings: &CommitSettings,
        tools: &T,
    ) -> anyhow::Result<CommitToOutcome> {
        let branch = BranchName::try_parse(options.branch.as_str())?;
        let parent = self
            .refs()
            .read_branch(&branch)?
            .ok_or_else(|| CommitToError::BranchNotFound(branch.to_string()))?;
        log::debug!("{branch} is at {parent}");

        let (records, plan) = {
            let index = self.index();
            let mut index = index.lock().await;
            index.rehydrate()?;

            let head_tree = match self.refs().read_head()? {
                Some(head) => Some(*self.database().load_commit(&head)?.tree_oid()),
                None => None,
            };
            let records = ChangeExtractor::new(self.database()).extract(head_tree.as_ref(), &index)?;
            let plan = TreeComposer::plan(&records, &index)?;

            (records, plan)
        };

        if records.is_empty() {
            writeln!(
                self.writer(),
                "nothing to commit, no changes added to the index"
            )?;
            return Ok(CommitToOutcome::NothingToCommit);
        }

        let target = self
            .database()
            .load_commit(&parent)
            .with_context(|| format!("unable to read the tip of '{branch}'"))?;

        if options.dry_run {
            self.print_dry_run(&branch, &parent, &target, &records)?;
            return Ok(CommitToOutcome::DryRun);
        }

        let now = identity::now();
        let author = settings.author.signature(Role::Author, now)?;
        let committer = settings.committer.signature(Role::Committer, now)?;

        let message = self
            .resolve_message(options, settings, tools, &branch, &parent, &records)
            .await?;

        let tree_oid = TreeComposer::new(self.database()).apply(target.tree_oid(), plan)?;

        let key = match &settings.signing {
            Signing::Enabled { key } => key.clone(),
            Signing::Disabled => None,
        };
        let request = SigningRequest {
            tree_oid,
            parent,
            author,
            committer,
            message,
            key,
        };

        let builder = CommitBuilder::new(self.database(), self.refs(), tools);
        let (commit_oid, commit) = builder.create_commit(request, &settings.signing).await?;
        builder.advance_branch(&branch, &parent, &commit_oid, &commit)?;

        // the commit is recorded; post-commit can only report
        if let Some(hook) = Hooks::new(settings.hooks_path.clone()).find(HookName::PostCommit)
            && let Err(err) = tools.run_hook(&hook, &[]).await
        {
            log::warn!("ignoring post-commit hook failure: {err:#}");
        }

        writeln!(
            self.writer(),
            "[{branch} {}] {}",
            commit_oid.to_short_oid(),
            commit.short_message()
        )?;

        Ok(CommitToOutcome::Committed { commit_oid, parent })
    }

    /// Cleaned message from `-m` or the editor, after the commit-msg hook
    async fn resolve_message<T: ExternalTools>(
        &self,
        options: &CommitToOptions,
        settings: &CommitSettings,
        tools: &T,
        branch: &BranchName,
        parent: &ObjectId,
        records: &[ChangeRecord],
    ) -> anyhow::Result<String> {
        let edit_path = self.git_dir().join(COMMIT_EDITMSG);
        let cleanup = settings.cleanup.effective(options.message.is_none());

        let raw = match &options.message {
            Some(message) if message.ends_with('\n') => message.clone(),
            Some(message) => format!("{message}\n"),
            None => {
                let patch = if settings.verbose {
                    Some(render_patch(self.database(), records)?)
                } else {
                    None
                };
                let template = MessageTemplate {
                    branch,
                    parent,
                    records,
                    cleanup: settings.cleanup,
                    patch,
                }
                .render();

                std::fs::write(&edit_path, template)
                    .with_context(|| format!("unable to write {}", edit_path.display()))?;
                tools.edit_message(&edit_path).await?;
                std::fs::read_to_string(&edit_path)
                    .with_context(|| format!("unable to read {}", edit_path.display()))?
            }
        };

        let mut cleaned = message::cleanup(&raw, cleanup);
        if message::is_empty(&cleaned) {
            return Err(CommitToError::EmptyMessage.into());
        }

        let hook = if options.no_verify {
            None
        } else {
            Hooks::new(settings.hooks_path.clone()).find(HookName::CommitMsg)
        };
        if let Some(hook) = hook {
            std::fs::write(&edit_path, &cleaned)
                .with_context(|| format!("unable to write {}", edit_path.display()))?;
            tools.run_hook(&hook, &[edit_path.as_path()]).await?;

            let rewritten = std::fs::read_to_string(&edit_path)
                .with_context(|| format!("unable to read {}", edit_path.display()))?;
            cleaned = message::cleanup(&rewritten, cleanup);
            if message::is_empty(&cleaned) {
                return Err(CommitToError::EmptyMessage.into());
            }
        }

        Ok(cleaned)
    }

    fn print_dry_run(
        &self,
        branch: &BranchName,
        parent: &ObjectId,
        target: &Commit,
        records: &[ChangeRecord],
    ) -> anyhow::Result<()> {
        let mut writer = self.writer();

        writeln!(writer, "Changes to be committed to '{branch}':")?;
        for record in records {
            writeln!(writer, "\t{}", record.status_line().green())?;
        }
        writeln!(
            writer,
            "{} {parent} {}",
            "Parent:".yellow(),
            target.short_message()
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::database::Database;
    use crate::areas::index::Index;
    use crate::artifacts::builder::identity::IdentityConfig;
    use crate::artifacts::builder::message::CleanupMode;
    use crate::artifacts::composer::scratch_tree::ScratchTree;
    use crate::artifacts::database::database_entry::DatabaseEntry;
    use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
    use crate::artifacts::index::index_entry::IndexEntry;
    use crate::artifacts::objects::blob::Blob;
    use crate::artifacts::objects::signature::Signature;
    use assert_fs::TempDir;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    const SIGNATURE: &str = "Ada Lovelace <ada@example.com> 1672574400 +0000";

    /// Shared buffer standing in for stdout
    #[derive(Clone, Default)]
    struct Output(Rc<RefCell<Vec<u8>>>);

    impl Write for Output {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Output {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    /// Records every call; editor and hooks write canned messages
    #[derive(Default)]
    struct StubTools {
        objects: PathBuf,
        editor_writes: Option<String>,
        commit_msg_writes: Option<String>,
        failing_hooks: Vec<&'static str>,
        templates: RefCell<Vec<String>>,
        hooks_run: RefCell<Vec<String>>,
        sign_requests: RefCell<Vec<SigningRequest>>,
    }

    impl ExternalTools for StubTools {
        async fn edit_message(&self, path: &Path) -> anyhow::Result<()> {
            self.templates
                .borrow_mut()
                .push(std::fs::read_to_string(path)?);
            if let Some(message) = &self.editor_writes {
                std::fs::write(path, message)?;
            }
            Ok(())
        }

        async fn sign(&self, request: &SigningRequest) -> anyhow::Result<ObjectId> {
            self.sign_requests.borrow_mut().push(request.clone());
            Database::new(self.objects.clone().into_boxed_path()).store(&request.unsigned_commit())
        }

        async fn run_hook(&self, hook: &Path, args: &[&Path]) -> anyhow::Result<()> {
            let name = hook.file_name().unwrap().to_string_lossy().into_owned();
            self.hooks_run.borrow_mut().push(name.clone());

            if name == "commit-msg"
                && let Some(message) = &self.commit_msg_writes
            {
                std::fs::write(args[0], message)?;
            }
            if self.failing_hooks.iter().any(|failing| *failing == name) {
                return Err(CommitToError::HookFailed {
                    hook: name,
                    reason: "exited with status 1".into(),
                }
                .into());
            }
            Ok(())
        }
    }

    struct Fixture {
        dir: TempDir,
        output: Output,
        repository: Repository,
        main_tip: ObjectId,
        feature_tip: ObjectId,
    }

    impl Fixture {
        fn git_dir(&self) -> PathBuf {
            self.dir.path().join(".git")
        }

        fn database(&self) -> Database {
            Database::new(self.git_dir().join("objects").into_boxed_path())
        }

        fn tools(&self) -> StubTools {
            StubTools {
                objects: self.git_dir().join("objects"),
                ..StubTools::default()
            }
        }

        fn settings(&self) -> CommitSettings {
            let identity = IdentityConfig {
                name: Some("Ada Lovelace".into()),
                email: Some("ada@example.com".into()),
                date: Some("1672574400 +0000".into()),
            };
            CommitSettings {
                author: identity.clone(),
                committer: identity,
                signing: Signing::Disabled,
                editor: "true".into(),
                cleanup: CleanupMode::Default,
                verbose: false,
                timeout: None,
                signer_program: "git".into(),
                hooks_path: self.git_dir().join("hooks"),
            }
        }

        fn options(&self, message: Option<&str>) -> CommitToOptions {
            CommitToOptions {
                branch: "main".into(),
                message: message.map(String::from),
                ..CommitToOptions::default()
            }
        }

        fn branch_tip(&self, name: &str) -> ObjectId {
            self.repository
                .refs()
                .read_branch(&BranchName::try_parse(name).unwrap())
                .unwrap()
                .unwrap()
        }

        fn files(&self, commit: &ObjectId) -> BTreeMap<String, String> {
            let database = self.database();
            let commit = database.load_commit(commit).unwrap();
            database
                .flatten_tree(commit.tree_oid())
                .unwrap()
                .into_iter()
                .map(|(path, entry)| {
                    let blob = database.load_blob(&entry.oid).unwrap();
                    (
                        path.display().to_string(),
                        String::from_utf8_lossy(blob.content()).into_owned(),
                    )
                })
                .collect()
        }

        fn install_hook(&self, name: &str) {
            let hooks = self.git_dir().join("hooks");
            std::fs::create_dir_all(&hooks).unwrap();
            std::fs::write(hooks.join(name), "#!/bin/sh\nexit 0\n").unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(
                    hooks.join(name),
                    std::fs::Permissions::from_mode(0o755),
                )
                .unwrap();
            }
        }
    }

    fn blob(database: &Database, content: &str) -> DatabaseEntry {
        let oid = database
            .store(&Blob::new(Bytes::from(content.to_string())))
            .unwrap();
        DatabaseEntry::new(oid, EntryMode::File(FileMode::Regular))
    }

    fn commit(database: &Database, files: &[(&str, &str)], message: &str) -> ObjectId {
        let mut scratch = ScratchTree::new(database, None).unwrap();
        for (path, content) in files {
            scratch
                .upsert(Path::new(path), blob(database, content))
                .unwrap();
        }
        let tree_oid = scratch.write().unwrap();
        let signature = Signature::try_from(SIGNATURE).unwrap();
        database
            .store(&Commit::new(
                tree_oid,
                vec![],
                signature.clone(),
                signature,
                format!("{message}\n"),
            ))
            .unwrap()
    }

    /// `main` holds README.md = "x"; `feature` is checked out with an
    /// unrelated tree and has `staged` in its index
    fn fixture_with(staged: &[(&str, &str)]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let git_dir = dir.path().join(".git");
        std::fs::create_dir_all(git_dir.join("objects")).unwrap();
        std::fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
        std::fs::write(git_dir.join("HEAD"), "ref: refs/heads/feature\n").unwrap();

        let database = Database::new(git_dir.join("objects").into_boxed_path());
        let main_tip = commit(&database, &[("README.md", "x")], "initial main");
        let feature_files = [("README.md", "feature readme"), ("notes.txt", "notes")];
        let feature_tip = commit(&database, &feature_files, "initial feature");
        std::fs::write(git_dir.join("refs/heads/main"), format!("{main_tip}\n")).unwrap();
        std::fs::write(git_dir.join("refs/heads/feature"), format!("{feature_tip}\n")).unwrap();

        let mut index = Index::new(git_dir.join("index").into_boxed_path());
        for (path, content) in feature_files.iter().chain(staged) {
            let entry = blob(&database, content);
            index.add(IndexEntry::new(PathBuf::from(path), entry.oid, entry.mode));
        }
        index.write_updates().unwrap();

        let output = Output::default();
        let repository = Repository::discover(dir.path(), Box::new(output.clone())).unwrap();

        Fixture {
            dir,
            output,
            repository,
            main_tip,
            feature_tip,
        }
    }

    #[fixture]
    fn staged() -> Fixture {
        fixture_with(&[("README.md", "z"), ("feature.go", "y")])
    }

    fn object_count(fixture: &Fixture) -> usize {
        std::fs::read_dir(fixture.git_dir().join("objects"))
            .unwrap()
            .map(|dir| std::fs::read_dir(dir.unwrap().path()).unwrap().count())
            .sum()
    }

    #[rstest]
    #[tokio::test]
    async fn commits_staged_changes_onto_the_target_branch(staged: Fixture) {
        let index_before = std::fs::read(staged.git_dir().join("index")).unwrap();
        let tools = staged.tools();

        let outcome = staged
            .repository
            .commit_to(&staged.options(Some("add feature")), &staged.settings(), &tools)
            .await
            .unwrap();

        let CommitToOutcome::Committed { commit_oid, parent } = outcome else {
            panic!("expected a commit, got {outcome:?}");
        };
        let commit = staged.database().load_commit(&commit_oid).unwrap();
        assert_eq!(parent, staged.main_tip);
        assert_eq!(commit.parents(), &[staged.main_tip]);
        assert_eq!(commit.message(), "add feature\n");
        assert_eq!(commit.author().display(), SIGNATURE);
        assert_eq!(
            staged.files(&commit_oid),
            BTreeMap::from([
                ("README.md".to_string(), "z".to_string()),
                ("feature.go".to_string(), "y".to_string()),
            ])
        );
        assert_eq!(staged.branch_tip("main"), commit_oid);
        assert_eq!(staged.branch_tip("feature"), staged.feature_tip);
        assert_eq!(
            std::fs::read(staged.git_dir().join("index")).unwrap(),
            index_before
        );
        assert_eq!(
            staged.output.text(),
            format!("[main {}] add feature\n", commit_oid.to_short_oid())
        );
        assert!(tools.templates.borrow().is_empty());
    }

    #[tokio::test]
    async fn nothing_staged_writes_nothing() {
        let fixture = fixture_with(&[]);
        let objects_before = object_count(&fixture);
        let mut settings = fixture.settings();
        settings.author = IdentityConfig::default();

        let outcome = fixture
            .repository
            .commit_to(&fixture.options(Some("unused")), &settings, &fixture.tools())
            .await
            .unwrap();

        assert_eq!(outcome, CommitToOutcome::NothingToCommit);
        assert_eq!(object_count(&fixture), objects_before);
        assert_eq!(fixture.branch_tip("main"), fixture.main_tip);
        assert_eq!(
            fixture.output.text(),
            "nothing to commit, no changes added to the index\n"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_branches_are_rejected(staged: Fixture) {
        let options = CommitToOptions {
            branch: "nope".into(),
            ..staged.options(Some("msg"))
        };

        let err = staged
            .repository
            .commit_to(&options, &staged.settings(), &staged.tools())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CommitToError>(),
            Some(CommitToError::BranchNotFound(name)) if name == "nope"
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn dry_run_reports_without_writing(staged: Fixture) {
        colored::control::set_override(false);
        let objects_before = object_count(&staged);
        let options = CommitToOptions {
            dry_run: true,
            ..staged.options(None)
        };

        let outcome = staged
            .repository
            .commit_to(&options, &staged.settings(), &staged.tools())
            .await
            .unwrap();

        assert_eq!(outcome, CommitToOutcome::DryRun);
        assert_eq!(object_count(&staged), objects_before);
        assert_eq!(staged.branch_tip("main"), staged.main_tip);
        assert_eq!(
            staged.output.text(),
            format!(
                "Changes to be committed to 'main':\n\
                 \tmodified:   README.md\n\
                 \tnew file:   feature.go\n\
                 Parent: {} initial main\n",
                staged.main_tip
            )
        );
    }

    #[rstest]
    #[tokio::test]
    async fn the_editor_gets_a_template_and_comments_are_stripped(staged: Fixture) {
        let tools = StubTools {
            editor_writes: Some("from the editor\n# ignored\n".into()),
            ..staged.tools()
        };

        let outcome = staged
            .repository
            .commit_to(&staged.options(None), &staged.settings(), &tools)
            .await
            .unwrap();

        let CommitToOutcome::Committed { commit_oid, .. } = outcome else {
            panic!("expected a commit, got {outcome:?}");
        };
        let template = tools.templates.borrow()[0].clone();
        assert!(template.contains(&format!(
            "# Committing to branch 'main' on top of {}.",
            staged.main_tip.to_short_oid()
        )));
        assert!(template.contains("#\tnew file:   feature.go\n"));
        assert!(!template.contains("diff --git"));
        assert_eq!(
            staged.database().load_commit(&commit_oid).unwrap().message(),
            "from the editor\n"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn verbose_templates_carry_the_diff(staged: Fixture) {
        let tools = StubTools {
            editor_writes: Some("verbose\n".into()),
            ..staged.tools()
        };
        let settings = CommitSettings {
            verbose: true,
            ..staged.settings()
        };

        staged
            .repository
            .commit_to(&staged.options(None), &settings, &tools)
            .await
            .unwrap();

        let template = tools.templates.borrow()[0].clone();
        assert!(template.contains(message::SCISSORS_LINE));
        assert!(template.contains("diff --git a/feature.go b/feature.go\n"));
    }

    #[rstest]
    #[tokio::test]
    async fn an_empty_message_aborts(staged: Fixture) {
        let objects_before = object_count(&staged);
        let tools = StubTools {
            editor_writes: Some("# only a comment\n\n".into()),
            ..staged.tools()
        };

        let err = staged
            .repository
            .commit_to(&staged.options(None), &staged.settings(), &tools)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CommitToError>(),
            Some(CommitToError::EmptyMessage)
        ));
        assert_eq!(object_count(&staged), objects_before);
        assert_eq!(staged.branch_tip("main"), staged.main_tip);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_identity_aborts_before_writing(staged: Fixture) {
        let mut settings = staged.settings();
        settings.author.email = None;
        settings.committer.email = None;

        let err = staged
            .repository
            .commit_to(&staged.options(Some("msg")), &settings, &staged.tools())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CommitToError>(),
            Some(CommitToError::IdentityUnresolved { role: "author", .. })
        ));
        assert_eq!(staged.branch_tip("main"), staged.main_tip);
    }

    #[cfg(unix)]
    #[rstest]
    #[tokio::test]
    async fn the_commit_msg_hook_can_rewrite_the_message(staged: Fixture) {
        staged.install_hook("commit-msg");
        let tools = StubTools {
            commit_msg_writes: Some("rewritten by hook\n".into()),
            ..staged.tools()
        };

        let outcome = staged
            .repository
            .commit_to(&staged.options(Some("original")), &staged.settings(), &tools)
            .await
            .unwrap();

        let CommitToOutcome::Committed { commit_oid, .. } = outcome else {
            panic!("expected a commit, got {outcome:?}");
        };
        assert_eq!(
            staged.database().load_commit(&commit_oid).unwrap().message(),
            "rewritten by hook\n"
        );
        assert_eq!(tools.hooks_run.borrow().as_slice(), &["commit-msg"]);
    }

    #[cfg(unix)]
    #[rstest]
    #[tokio::test]
    async fn no_verify_skips_the_commit_msg_hook(staged: Fixture) {
        staged.install_hook("commit-msg");
        let tools = staged.tools();
        let options = CommitToOptions {
            no_verify: true,
            ..staged.options(Some("unchecked"))
        };

        staged
            .repository
            .commit_to(&options, &staged.settings(), &tools)
            .await
            .unwrap();

        assert!(tools.hooks_run.borrow().is_empty());
    }

    #[cfg(unix)]
    #[rstest]
    #[tokio::test]
    async fn a_failing_commit_msg_hook_leaves_the_branch_alone(staged: Fixture) {
        staged.install_hook("commit-msg");
        let tools = StubTools {
            failing_hooks: vec!["commit-msg"],
            ..staged.tools()
        };

        let err = staged
            .repository
            .commit_to(&staged.options(Some("msg")), &staged.settings(), &tools)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CommitToError>(),
            Some(CommitToError::HookFailed { .. })
        ));
        assert_eq!(staged.branch_tip("main"), staged.main_tip);
    }

    #[cfg(unix)]
    #[rstest]
    #[tokio::test]
    async fn post_commit_failures_are_ignored(staged: Fixture) {
        staged.install_hook("post-commit");
        let tools = StubTools {
            failing_hooks: vec!["post-commit"],
            ..staged.tools()
        };

        let outcome = staged
            .repository
            .commit_to(&staged.options(Some("msg")), &staged.settings(), &tools)
            .await
            .unwrap();

        let CommitToOutcome::Committed { commit_oid, .. } = outcome else {
            panic!("expected a commit, got {outcome:?}");
        };
        assert_eq!(staged.branch_tip("main"), commit_oid);
        assert_eq!(tools.hooks_run.borrow().as_slice(), &["post-commit"]);
    }

    #[rstest]
    #[tokio::test]
    async fn signed_commits_use_the_signer_output(staged: Fixture) {
        let tools = staged.tools();
        let settings = CommitSettings {
            signing: Signing::Enabled {
                key: Some("KEY".into()),
            },
            ..staged.settings()
        };

        let outcome = staged
            .repository
            .commit_to(&staged.options(Some("signed")), &settings, &tools)
            .await
            .unwrap();

        let requests = tools.sign_requests.borrow();
        let request = &requests[0];
        let expected = Database::new(staged.git_dir().join("objects").into_boxed_path())
            .store(&request.unsigned_commit())
            .unwrap();
        assert_eq!(
            outcome,
            CommitToOutcome::Committed {
                commit_oid: expected,
                parent: staged.main_tip
            }
        );
        assert_eq!(request.key.as_deref(), Some("KEY"));
        assert_eq!(request.parent, staged.main_tip);
        assert!(request.environment().contains(&(
            "GIT_AUTHOR_DATE".to_string(),
            "1672574400 +0000".to_string()
        )));
        assert_eq!(staged.branch_tip("main"), expected);
    }
}
