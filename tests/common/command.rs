use crate::common::file::{FileSpec, write_file};
use crate::common::{AUTHOR_DATE, AUTHOR_EMAIL, AUTHOR_NAME};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::PathBuf;

/// Variables that would leak the developer's own setup into a test
const SCRUBBED_VARS: &[&str] = &[
    "GIT_DIR",
    "GIT_INDEX_FILE",
    "GIT_WORK_TREE",
    "GIT_CONFIG_GLOBAL",
    "GIT_EDITOR",
    "VISUAL",
    "EDITOR",
    "COMMIT_TO_TIMEOUT",
    "RUST_LOG",
];

/// A repository and a private home directory, side by side
pub struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(root.path().join("repo")).expect("Failed to create repo dir");
        std::fs::create_dir_all(root.path().join("home")).expect("Failed to create home dir");
        Sandbox { root }
    }

    pub fn repo(&self) -> PathBuf {
        self.root.path().join("repo")
    }

    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    pub fn git_path(&self, path: &str) -> PathBuf {
        self.repo().join(".git").join(path)
    }

    fn isolate(&self, cmd: &mut Command) {
        for var in SCRUBBED_VARS {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.home())
            .env("XDG_CONFIG_HOME", self.home().join(".config"))
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_AUTHOR_NAME", AUTHOR_NAME)
            .env("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL)
            .env("GIT_AUTHOR_DATE", AUTHOR_DATE)
            .env("GIT_COMMITTER_NAME", AUTHOR_NAME)
            .env("GIT_COMMITTER_EMAIL", AUTHOR_EMAIL)
            .env("GIT_COMMITTER_DATE", AUTHOR_DATE)
            .current_dir(self.repo());
    }

    pub fn commit_to(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("commit-to").expect("Failed to find commit-to binary");
        self.isolate(&mut cmd);
        cmd.args(args);
        cmd
    }

    pub fn git_command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        self.isolate(&mut cmd);
        cmd.args(args);
        cmd
    }

    /// Run git, expecting success, and return its stdout without the trailing newline
    pub fn git(&self, args: &[&str]) -> String {
        let output = self
            .git_command(args)
            .output()
            .unwrap_or_else(|e| panic!("Failed to run git {:?}: {}", args, e));
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim_end().to_string()
    }

    /// Like [`Sandbox::git`], feeding `input` on stdin
    pub fn git_with_input(&self, args: &[&str], input: &str) -> String {
        let output = self
            .git_command(args)
            .write_stdin(input.to_string())
            .output()
            .unwrap_or_else(|e| panic!("Failed to run git {:?}: {}", args, e));
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim_end().to_string()
    }

    pub fn write(&self, path: &str, content: &str) {
        write_file(&FileSpec::new(self.repo().join(path), content.to_string()));
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.repo().join(path))
            .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e))
    }

    pub fn rev_parse(&self, rev: &str) -> String {
        self.git(&["rev-parse", rev])
    }

    /// Paths in the tree of `rev`, one per line
    pub fn ls_files(&self, rev: &str) -> String {
        self.git(&["ls-tree", "-r", "--name-only", rev])
    }

    pub fn show(&self, rev_path: &str) -> String {
        self.git(&["show", rev_path])
    }

    /// `git diff --cached --name-status`, the staged change set
    pub fn staged(&self) -> String {
        self.git(&["diff", "--cached", "--name-status", "-M"])
    }
}

/// `main` holding `README.md = "x"`, and a checked-out `feature` branch that
/// shares no history with it
#[fixture]
pub fn diverged() -> Sandbox {
    let sandbox = Sandbox::new();
    sandbox.git(&["-c", "init.defaultBranch=main", "init", "-q"]);

    sandbox.write("README.md", "x\n");
    sandbox.git(&["add", "README.md"]);
    sandbox.git(&["commit", "-q", "-m", "initial main"]);

    sandbox.git(&["checkout", "-q", "--orphan", "feature"]);
    sandbox.git(&["rm", "-q", "-r", "--cached", "."]);
    sandbox.write("README.md", "feature readme\n");
    sandbox.write("notes/todo.txt", "nothing yet\n");
    sandbox.git(&["add", "README.md", "notes/todo.txt"]);
    sandbox.git(&["commit", "-q", "-m", "initial feature"]);

    sandbox
}

/// `main` with a few directories, and `feature` branched off it and checked out
#[fixture]
pub fn branched() -> Sandbox {
    let sandbox = Sandbox::new();
    sandbox.git(&["-c", "init.defaultBranch=main", "init", "-q"]);

    sandbox.write("README.md", "readme\n");
    sandbox.write(
        "lib/util.rs",
        "pub fn one() -> u32 {\n    1\n}\n\npub fn two() -> u32 {\n    2\n}\n",
    );
    sandbox.write("docs/guide.md", "guide\n");
    sandbox.git(&["add", "."]);
    sandbox.git(&["commit", "-q", "-m", "initial"]);
    sandbox.git(&["checkout", "-q", "-b", "feature"]);

    sandbox
}
