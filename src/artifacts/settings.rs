//! Settings resolved once per invocation
//!
//! The process environment and the git config files are read a single time
//! when the command starts. Everything downstream works from the resulting
//! [`CommitSettings`], so a config edit made while the editor is open has no
//! effect on the running commit.

use crate::areas::config::{GitConfig, resolve_path};
use crate::areas::repository::Repository;
use crate::artifacts::builder::identity::{IdentityConfig, Role};
use crate::artifacts::builder::message::CleanupMode;
use crate::artifacts::builder::signing::Signing;
use anyhow::Context;
use clap::ValueEnum;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_EDITOR: &str = "vi";
const DEFAULT_SIGNER: &str = "git";
const TIMEOUT_VAR: &str = "COMMIT_TO_TIMEOUT";

/// Snapshot of the process environment
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn capture() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<K: Into<String>, V: Into<String>>(
        vars: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Environment {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`Environment::get`], but treats an empty value as unset
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    pub fn home(&self) -> Option<PathBuf> {
        self.non_empty("HOME").map(PathBuf::from)
    }

    /// Config files to load, lowest precedence first
    pub fn config_paths(&self, common_dir: &Path) -> Vec<PathBuf> {
        let home = self.home();
        let mut paths = Vec::new();

        match (self.non_empty("XDG_CONFIG_HOME"), &home) {
            (Some(xdg), _) => paths.push(Path::new(xdg).join("git").join("config")),
            (None, Some(home)) => paths.push(home.join(".config").join("git").join("config")),
            (None, None) => {}
        }

        match (self.non_empty("GIT_CONFIG_GLOBAL"), &home) {
            (Some(global), _) => paths.push(PathBuf::from(global)),
            (None, Some(home)) => paths.push(home.join(".gitconfig")),
            (None, None) => {}
        }

        paths.push(common_dir.join("config"));
        paths
    }
}

/// Command-line choices that take precedence over config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `Some(true)` for `-S`, `Some(false)` for `--no-gpg-sign`
    pub sign: Option<bool>,
    pub signing_key: Option<String>,
    pub cleanup: Option<CleanupMode>,
    pub verbose: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSettings {
    pub author: IdentityConfig,
    pub committer: IdentityConfig,
    pub signing: Signing,
    pub editor: String,
    pub cleanup: CleanupMode,
    pub verbose: bool,
    /// Bound on editor, signer and hook runs; `None` waits forever
    pub timeout: Option<Duration>,
    pub signer_program: String,
    pub hooks_path: PathBuf,
}

impl CommitSettings {
    /// Load config files for `repository` and resolve every setting
    pub fn load(
        repository: &Repository,
        env: &Environment,
        overrides: &Overrides,
    ) -> anyhow::Result<Self> {
        let config = GitConfig::load(
            &env.config_paths(repository.common_dir()),
            env.home().as_deref(),
        )?;

        Self::resolve(
            &config,
            env,
            overrides,
            repository.work_tree(),
            repository.common_dir(),
        )
    }

    pub fn resolve(
        config: &GitConfig,
        env: &Environment,
        overrides: &Overrides,
        work_tree: &Path,
        common_dir: &Path,
    ) -> anyhow::Result<Self> {
        let author = Self::identity(config, env, Role::Author, None);
        let committer = Self::identity(config, env, Role::Committer, Some(&author));

        let sign = match overrides.sign {
            Some(sign) => sign,
            None => config.get_bool("commit.gpgSign")?.unwrap_or(false),
        };
        let signing = if sign {
            Signing::Enabled {
                key: overrides
                    .signing_key
                    .clone()
                    .or_else(|| config.get("user.signingKey").map(str::to_string)),
            }
        } else {
            Signing::Disabled
        };

        let editor = env
            .non_empty("GIT_EDITOR")
            .or_else(|| config.get("core.editor").filter(|value| !value.is_empty()))
            .or_else(|| env.non_empty("VISUAL"))
            .or_else(|| env.non_empty("EDITOR"))
            .unwrap_or(DEFAULT_EDITOR)
            .to_string();

        let cleanup = match overrides.cleanup {
            Some(cleanup) => cleanup,
            None => match config.get("commit.cleanup") {
                Some(value) => CleanupMode::from_str(value, true)
                    .map_err(|_| anyhow::anyhow!("invalid cleanup mode '{value}'"))
                    .context("bad config value for 'commit.cleanup'")?,
                None => CleanupMode::Default,
            },
        };

        let verbose = overrides.verbose || config.get_bool("commit.verbose")?.unwrap_or(false);

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => Some(secs),
            None => match env.non_empty(TIMEOUT_VAR) {
                Some(value) => Some(
                    value
                        .trim()
                        .parse::<u64>()
                        .with_context(|| format!("invalid {TIMEOUT_VAR} '{value}'"))?,
                ),
                None => config.get_u64("commitTo.timeout")?,
            },
        };
        // zero means no limit
        let timeout = timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let signer_program = config
            .get("commitTo.signerProgram")
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_SIGNER)
            .to_string();

        let hooks_path = match config.get("core.hooksPath") {
            Some(path) => resolve_path(path, work_tree, env.home().as_deref()),
            None => common_dir.join("hooks"),
        };

        Ok(CommitSettings {
            author,
            committer,
            signing,
            editor,
            cleanup,
            verbose,
            timeout,
            signer_program,
            hooks_path,
        })
    }

    /// Environment > `<role>.name` > `user.name`, and the same for email
    ///
    /// The committer falls back to the author when nothing committer-specific
    /// is set.
    fn identity(
        config: &GitConfig,
        env: &Environment,
        role: Role,
        fallback: Option<&IdentityConfig>,
    ) -> IdentityConfig {
        let lookup = |field: &str| -> Option<String> {
            let var = format!("{}_{}", role.env_prefix(), field.to_uppercase());
            env.get(&var)
                .or_else(|| config.get(&format!("{}.{field}", role.as_str())))
                .map(str::to_string)
        };

        let (name, email) = match fallback {
            Some(author) => (
                lookup("name").or_else(|| author.name.clone()),
                lookup("email").or_else(|| author.email.clone()),
            ),
            None => (
                lookup("name").or_else(|| config.get("user.name").map(str::to_string)),
                lookup("email").or_else(|| config.get("user.email").map(str::to_string)),
            ),
        };

        IdentityConfig {
            name,
            email,
            date: env
                .non_empty(&format!("{}_DATE", role.env_prefix()))
                .map(str::to_string),
        }
    }
}
