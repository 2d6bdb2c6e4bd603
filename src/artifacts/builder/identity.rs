//! Author and committer identities
//!
//! Names and emails are collected from the environment and config when the
//! settings are loaded, but only turned into a [`Signature`] once a commit is
//! actually about to be written.

use crate::artifacts::objects::signature::{Signature, parse_offset};
use crate::errors::CommitToError;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Author,
    Committer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "author",
            Role::Committer => "committer",
        }
    }

    /// Prefix of the `GIT_<ROLE>_NAME`-style variables
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Role::Author => "GIT_AUTHOR",
            Role::Committer => "GIT_COMMITTER",
        }
    }
}

/// Name, email and date as configured, not yet validated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityConfig {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
}

impl IdentityConfig {
    /// Build the signature, using `now` unless a date was configured
    pub fn signature(&self, role: Role, now: DateTime<FixedOffset>) -> anyhow::Result<Signature> {
        let unresolved = |reason: String| CommitToError::IdentityUnresolved {
            role: role.as_str(),
            reason,
        };

        let name = self.name.as_deref().map(sanitize).ok_or_else(|| {
            unresolved(format!(
                "no name configured (set user.name or {}_NAME)",
                role.env_prefix()
            ))
        })?;
        if name.is_empty() {
            return Err(unresolved("empty ident name not allowed".to_string()).into());
        }

        let email = self.email.as_deref().map(sanitize).ok_or_else(|| {
            unresolved(format!(
                "no email configured (set user.email or {}_EMAIL)",
                role.env_prefix()
            ))
        })?;

        let timestamp = match self.date.as_deref() {
            Some(date) => parse_date(date)
                .ok_or_else(|| unresolved(format!("invalid date format: {date}")))?,
            None => now,
        };

        Ok(Signature::new(name, email, timestamp))
    }
}

/// Characters that would break the `Name <email>` framing are dropped
fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\n'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Wall-clock time in the local offset
pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Parse the date formats git accepts in `GIT_AUTHOR_DATE`
///
/// Supported: raw `<unix> <tz>`, `@<unix> [<tz>]`, RFC 2822, RFC 3339 and
/// `YYYY-MM-DD HH:MM:SS <tz>`. A naive `YYYY-MM-DD HH:MM:SS` is taken as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Some(date) = parse_raw(value.strip_prefix('@').unwrap_or(value)) {
        return Some(date);
    }

    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
        })
}

fn parse_raw(value: &str) -> Option<DateTime<FixedOffset>> {
    let mut parts = value.split_whitespace();
    let seconds = parts.next()?.parse::<i64>().ok()?;
    let offset = match parts.next() {
        Some(offset) => parse_offset(offset).ok()?,
        None => FixedOffset::east_opt(0)?,
    };
    if parts.next().is_some() {
        return None;
    }

    DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(&offset))
}
