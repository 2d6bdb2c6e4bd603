//! Commit message templating and cleanup

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::staging::change_record::ChangeRecord;

pub const COMMENT_CHAR: char = '#';
pub const SCISSORS_LINE: &str = "# ------------------------ >8 ------------------------";

/// How a message is tidied before it is committed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CleanupMode {
    /// Strip blank lines, trailing whitespace, comments and the scissors section
    Strip,
    /// Strip blank lines and trailing whitespace only
    Whitespace,
    /// Keep the message untouched
    Verbatim,
    /// Like whitespace, but also drop everything below the scissors line
    Scissors,
    /// Strip when the message was edited, whitespace otherwise
    #[default]
    Default,
}

impl CleanupMode {
    /// Resolve `Default` for a message that was (or wasn't) edited
    pub fn effective(self, edited: bool) -> Self {
        match self {
            CleanupMode::Default if edited => CleanupMode::Strip,
            CleanupMode::Default => CleanupMode::Whitespace,
            mode => mode,
        }
    }
}

pub fn cleanup(message: &str, mode: CleanupMode) -> String {
    match mode {
        CleanupMode::Verbatim => message.to_string(),
        CleanupMode::Whitespace => strip_whitespace(message.lines()),
        CleanupMode::Scissors => strip_whitespace(above_scissors(message)),
        CleanupMode::Strip | CleanupMode::Default => strip_whitespace(
            above_scissors(message).filter(|line| !line.starts_with(COMMENT_CHAR)),
        ),
    }
}

/// Whether nothing but whitespace is left
pub fn is_empty(message: &str) -> bool {
    message.trim().is_empty()
}

fn above_scissors(message: &str) -> impl Iterator<Item = &str> {
    message.lines().take_while(|line| *line != SCISSORS_LINE)
}

fn strip_whitespace<'m>(lines: impl Iterator<Item = &'m str>) -> String {
    let mut cleaned = String::new();
    let mut pending_blank = false;

    for line in lines.map(str::trim_end) {
        if line.is_empty() {
            pending_blank = !cleaned.is_empty();
            continue;
        }
        if pending_blank {
            cleaned.push('\n');
            pending_blank = false;
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }

    cleaned
}

/// Content of `COMMIT_EDITMSG` before the editor opens
#[derive(Debug)]
pub struct MessageTemplate<'a> {
    pub branch: &'a BranchName,
    pub parent: &'a ObjectId,
    pub records: &'a [ChangeRecord],
    pub cleanup: CleanupMode,
    /// Unified diff shown below the scissors line in verbose mode
    pub patch: Option<String>,
}

impl MessageTemplate<'_> {
    pub fn render(&self) -> String {
        let mut template = String::from("\n");

        let instructions = match self.cleanup.effective(true) {
            CleanupMode::Strip => {
                "Please enter the commit message for your changes. Lines starting\n\
                 with '#' will be ignored, and an empty message aborts the commit."
            }
            _ => {
                "Please enter the commit message for your changes. Lines starting\n\
                 with '#' will be kept; you may remove them yourself if you want to.\n\
                 An empty message aborts the commit."
            }
        };
        for line in instructions.lines() {
            template.push_str(&comment(line));
        }
        template.push_str(&comment(""));
        template.push_str(&comment(&format!(
            "Committing to branch '{}' on top of {}.",
            self.branch,
            self.parent.to_short_oid()
        )));
        template.push_str(&comment(""));
        template.push_str(&comment("Changes to be committed:"));
        for record in self.records {
            template.push_str(&comment(&format!("\t{}", record.status_line())));
        }
        template.push_str(&comment(""));

        if let Some(patch) = &self.patch {
            template.push_str(SCISSORS_LINE);
            template.push('\n');
            template.push_str(&comment("Do not modify or remove the line above."));
            template.push_str(&comment("Everything below it will be ignored."));
            template.push_str(patch);
        }

        template
    }
}

fn comment(line: &str) -> String {
    if line.is_empty() || line.starts_with('\t') {
        format!("{COMMENT_CHAR}{line}\n")
    } else {
        format!("{COMMENT_CHAR} {line}\n")
    }
}
