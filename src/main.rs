use clap::Parser;
use clap::error::ErrorKind;
use commit_to::areas::repository::Repository;
use commit_to::artifacts::builder::message::CleanupMode;
use commit_to::artifacts::external::process::ProcessTools;
use commit_to::artifacts::settings::{CommitSettings, Environment, Overrides};
use commit_to::commands::porcelain::commit_to::CommitToOptions;
use is_terminal::IsTerminal;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "commit-to",
    version,
    author = "Sami Barbut-Dica",
    about = "Commit staged changes onto another branch",
    long_about = "Records the changes staged in the index as a new commit on <BRANCH>, \
    without checking it out. The staged diff is taken against HEAD and replayed onto the \
    branch's current tree. The working tree and the index are left untouched.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
{all-args}
"
)]
struct Cli {
    #[arg(index = 1, help = "The branch to commit onto")]
    branch: String,
    #[arg(short, long, help = "Use the given message instead of launching an editor")]
    message: Option<String>,
    #[arg(short, long, help = "Show the staged diff in the commit message template")]
    verbose: bool,
    #[arg(long, help = "Show what would be committed, without writing anything")]
    dry_run: bool,
    #[arg(
        short = 'S',
        long = "gpg-sign",
        value_name = "KEYID",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "",
        overrides_with = "no_gpg_sign",
        help = "Sign the commit, optionally with a specific key"
    )]
    gpg_sign: Option<String>,
    #[arg(long, overrides_with = "gpg_sign", help = "Do not sign, even if commit.gpgSign is set")]
    no_gpg_sign: bool,
    #[arg(short = 'n', long, help = "Bypass the commit-msg hook")]
    no_verify: bool,
    #[arg(long, value_enum, value_name = "MODE", help = "How to clean up the commit message")]
    cleanup: Option<CleanupMode>,
    #[arg(
        long,
        value_name = "SECS",
        help = "Give up on the editor, signer or hooks after this many seconds (0 waits forever)"
    )]
    timeout: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let sign = if self.no_gpg_sign {
            Some(false)
        } else {
            self.gpg_sign.as_ref().map(|_| true)
        };

        Overrides {
            sign,
            signing_key: self.gpg_sign.clone().filter(|key| !key.is_empty()),
            cleanup: self.cleanup,
            verbose: self.verbose,
            timeout_secs: self.timeout,
        }
    }

    fn options(&self) -> CommitToOptions {
        CommitToOptions {
            branch: self.branch.clone(),
            message: self.message.clone(),
            dry_run: self.dry_run,
            no_verify: self.no_verify,
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let pwd = std::env::current_dir()?;
    let repository = Repository::discover(&pwd, Box::new(std::io::stdout()))?;

    let env = Environment::capture();
    let settings = CommitSettings::load(&repository, &env, &cli.overrides())?;
    let tools = ProcessTools::new(
        settings.editor.clone(),
        settings.signer_program.clone(),
        repository.work_tree().to_path_buf(),
        settings.timeout,
    );

    repository
        .commit_to(&cli.options(), &settings, &tools)
        .await?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    colored::control::set_override(std::io::stdout().is_terminal());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: unable to start the runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
