//! Git configuration files
//!
//! Reads the INI dialect git uses for `config`, `~/.gitconfig` and the XDG
//! config file. Section and key names are case-insensitive, subsection names
//! are not. When several files define the same key, the last one loaded wins.
//!
//! `include.path` pulls another file in at the point it appears, relative to
//! the including file. Conditional `includeIf` sections are not evaluated.

use anyhow::Context;
use std::path::{Path, PathBuf};

const SECTION_REGEX: &str = r#"^\[\s*([A-Za-z0-9.-]+)(?:\s+"((?:[^"\\]|\\.)*)")?\s*\](.*)$"#;
const KEY_REGEX: &str = r"^([A-Za-z][A-Za-z0-9-]*)\s*(?:=(.*))?$";
const INCLUDE_KEY: &str = "include.path";
/// Same nesting limit as git, which also catches include cycles
const MAX_INCLUDE_DEPTH: usize = 10;

/// Where a file being parsed lives, so its includes can be resolved
#[derive(Debug, Clone, Copy)]
struct Origin<'a> {
    dir: &'a Path,
    home: Option<&'a Path>,
    depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GitConfig {
    /// Normalized `section[.subsection].key` to value; `None` for keys
    /// written without `=`
    entries: Vec<(String, Option<String>)>,
}

impl GitConfig {
    /// Load the given files in order; missing files are skipped
    ///
    /// `home` expands `~/` in include paths.
    pub fn load(paths: &[PathBuf], home: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = GitConfig::default();

        for path in paths {
            if path.is_file() {
                config.load_file(path, home, 0)?;
            }
        }

        Ok(config)
    }

    fn load_file(&mut self, path: &Path, home: Option<&Path>, depth: usize) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let origin = Origin {
            dir: path.parent().unwrap_or(Path::new("")),
            home,
            depth,
        };
        self.parse_into(&content, Some(origin))
            .with_context(|| format!("bad config file {}", path.display()))?;
        log::trace!("loaded config from {}", path.display());

        Ok(())
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut config = GitConfig::default();
        config.parse_into(content, None)?;
        Ok(config)
    }

    /// Last string value for `key`, e.g. `user.name`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.last(key).and_then(|value| value.as_deref())
    }

    /// Last boolean value for `key`; a key without `=` counts as true
    pub fn get_bool(&self, key: &str) -> anyhow::Result<Option<bool>> {
        match self.last(key) {
            None => Ok(None),
            Some(None) => Ok(Some(true)),
            Some(Some(value)) => parse_bool(value)
                .map(Some)
                .with_context(|| format!("bad boolean config value '{value}' for '{key}'")),
        }
    }

    pub fn get_u64(&self, key: &str) -> anyhow::Result<Option<u64>> {
        self.get(key)
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("bad numeric config value '{value}' for '{key}'"))
            })
            .transpose()
    }

    fn last(&self, key: &str) -> Option<&Option<String>> {
        let key = normalize_key(key);
        self.entries
            .iter()
            .rev()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    fn parse_into(&mut self, content: &str, origin: Option<Origin>) -> anyhow::Result<()> {
        let section_re = regex::Regex::new(SECTION_REGEX)?;
        let key_re = regex::Regex::new(KEY_REGEX)?;

        let mut section: Option<String> = None;
        let mut lines = content.lines().enumerate();

        while let Some((number, raw_line)) = lines.next() {
            let mut line = raw_line.trim();

            if let Some(captures) = section_re.captures(line) {
                let name = captures[1].to_lowercase();
                section = Some(match captures.get(2) {
                    Some(subsection) => format!("{name}.{}", unescape_subsection(subsection.as_str())),
                    None => name,
                });

                // `[section] key = value` on one line
                line = captures.get(3).map_or("", |rest| rest.as_str()).trim();
            }

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let captures = key_re
                .captures(line)
                .with_context(|| format!("line {}: cannot parse '{raw_line}'", number + 1))?;
            let section = section
                .as_deref()
                .with_context(|| format!("line {}: key outside of a section", number + 1))?;

            let key = format!("{section}.{}", captures[1].to_lowercase());
            let value = match captures.get(2) {
                Some(value) => Some(
                    parse_value(value.as_str(), &mut lines.by_ref().map(|(_, line)| line))
                        .with_context(|| format!("line {}: bad value", number + 1))?,
                ),
                None => None,
            };

            if key == INCLUDE_KEY
                && let (Some(origin), Some(include)) = (origin, value.as_deref())
            {
                self.include(include, origin)?;
            }
            self.entries.push((key, value));
        }

        Ok(())
    }

    /// Load an included file in place; a missing file is ignored like git does
    fn include(&mut self, include: &str, origin: Origin) -> anyhow::Result<()> {
        if origin.depth >= MAX_INCLUDE_DEPTH {
            anyhow::bail!("exceeded maximum include depth ({MAX_INCLUDE_DEPTH}) at '{include}'");
        }

        let path = resolve_path(include, origin.dir, origin.home);
        if !path.is_file() {
            log::debug!("skipping missing config include {}", path.display());
            return Ok(());
        }

        self.load_file(&path, origin.home, origin.depth + 1)
    }
}

/// Lowercase the section and key name, keep the subsection as written
fn normalize_key(key: &str) -> String {
    match (key.find('.'), key.rfind('.')) {
        (Some(first), Some(last)) if first != last => format!(
            "{}{}{}",
            key[..first].to_lowercase(),
            &key[first..last],
            key[last..].to_lowercase()
        ),
        _ => key.to_lowercase(),
    }
}

fn unescape_subsection(subsection: &str) -> String {
    let mut result = String::with_capacity(subsection.len());
    let mut chars = subsection.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => result.extend(chars.next()),
            c => result.push(c),
        }
    }
    result
}

/// Decode a value: quotes, escapes, inline comments and `\` continuations
fn parse_value<'a>(
    first: &'a str,
    rest: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<String> {
    let mut value = String::new();
    let mut pending_space = String::new();
    let mut in_quote = false;
    let mut line = first.trim_start();

    loop {
        let mut chars = line.chars();
        let mut continued = false;

        while let Some(c) = chars.next() {
            let decoded = match c {
                '\\' => match chars.next() {
                    None => {
                        continued = true;
                        break;
                    }
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('b') => '\u{8}',
                    Some('"') => '"',
                    Some('\\') => '\\',
                    Some(other) => anyhow::bail!("invalid escape sequence '\\{other}'"),
                },
                '"' => {
                    value.push_str(&pending_space);
                    pending_space.clear();
                    in_quote = !in_quote;
                    continue;
                }
                '#' | ';' if !in_quote => break,
                c if c.is_whitespace() && !in_quote => {
                    if !value.is_empty() {
                        pending_space.push(c);
                    }
                    continue;
                }
                c => c,
            };

            value.push_str(&pending_space);
            pending_space.clear();
            value.push(decoded);
        }

        if !continued {
            break;
        }
        line = rest.next().unwrap_or_default();
    }

    if in_quote {
        anyhow::bail!("unterminated quoted value");
    }

    Ok(value)
}

pub fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        other => anyhow::bail!("'{other}' is not a boolean"),
    }
}

/// Resolve `path` against `base` unless it is absolute; `~/` expands to `home`
pub fn resolve_path(path: &str, base: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => base.join(path),
    }
}
