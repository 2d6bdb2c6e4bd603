//! [`ExternalTools`] backed by real processes
//!
//! Every child is spawned with `kill_on_drop`, so a timed out wait also
//! terminates the process.

use crate::artifacts::builder::signing::SigningRequest;
use crate::artifacts::external::ExternalTools;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::CommitToError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct ProcessTools {
    /// Editor command line, interpreted by the shell like git does
    editor: String,
    signer_program: String,
    work_tree: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessTools {
    pub fn new(
        editor: String,
        signer_program: String,
        work_tree: PathBuf,
        timeout: Option<Duration>,
    ) -> Self {
        ProcessTools {
            editor,
            signer_program,
            work_tree,
            timeout,
        }
    }

    fn command(&self, program: &str) -> Command {
        let mut command = Command::new(program);
        command.current_dir(&self.work_tree).kill_on_drop(true);
        command
    }

    /// Await `task`, bounded by the configured timeout
    async fn bounded<T>(
        &self,
        program: &str,
        task: impl Future<Output = std::io::Result<T>>,
    ) -> anyhow::Result<T> {
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, task).await.map_err(|_| {
                CommitToError::TimedOut {
                    program: program.to_string(),
                    timeout,
                }
            })?,
            None => task.await,
        };

        Ok(result?)
    }
}

fn unavailable(program: &str) -> impl FnOnce(std::io::Error) -> CommitToError + '_ {
    move |source| CommitToError::ExternalProcessUnavailable {
        program: program.to_string(),
        source,
    }
}

fn describe(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by a signal".to_string(),
    }
}

impl ExternalTools for ProcessTools {
    async fn edit_message(&self, path: &Path) -> anyhow::Result<()> {
        log::debug!("launching editor '{}' on {}", self.editor, path.display());

        let mut child = self
            .command("sh")
            .arg("-c")
            .arg(format!("{} \"$@\"", self.editor))
            .arg(&self.editor)
            .arg(path)
            .spawn()
            .map_err(unavailable(&self.editor))?;

        let status = self.bounded(&self.editor, child.wait()).await?;
        if !status.success() {
            return Err(CommitToError::EditorFailed {
                editor: self.editor.clone(),
                reason: describe(status),
            }
            .into());
        }

        Ok(())
    }

    async fn sign(&self, request: &SigningRequest) -> anyhow::Result<ObjectId> {
        let program = self.signer_program.as_str();
        let sign_flag = format!("-S{}", request.key.as_deref().unwrap_or_default());
        log::debug!("signing commit of tree {} with {program}", request.tree_oid);

        let mut child = self
            .command(program)
            .arg("commit-tree")
            .arg(request.tree_oid.to_string())
            .arg("-p")
            .arg(request.parent.to_string())
            .arg(sign_flag)
            .envs(request.environment())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(unavailable(program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CommitToError::SigningFailed(format!("no stdin for {program}")))?;
        let message = request.message.clone();
        let task = async move {
            // a signer may exit without reading the message
            if let Err(err) = stdin.write_all(message.as_bytes()).await
                && err.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(err);
            }
            drop(stdin);
            child.wait_with_output().await
        };

        let output = self.bounded(program, task).await?;
        if !output.status.success() {
            return Err(CommitToError::SigningFailed(format!(
                "{program} {}",
                describe(output.status)
            ))
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let commit_id = stdout.trim();
        if commit_id.is_empty() {
            return Err(
                CommitToError::SigningFailed(format!("{program} produced no commit id")).into(),
            );
        }

        ObjectId::try_parse(commit_id).map_err(|_| {
            CommitToError::SigningFailed(format!("{program} returned '{commit_id}'")).into()
        })
    }

    async fn run_hook(&self, hook: &Path, args: &[&Path]) -> anyhow::Result<()> {
        let program = hook.display().to_string();
        let hook_name = hook
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());
        log::debug!("running {hook_name} hook");

        // hooks report on stderr, stdout belongs to the command
        let mut child = self
            .command(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .spawn()
            .map_err(unavailable(&program))?;

        let status = self.bounded(&program, child.wait()).await?;
        if !status.success() {
            return Err(CommitToError::HookFailed {
                hook: hook_name,
                reason: describe(status),
            }
            .into());
        }

        Ok(())
    }
}
