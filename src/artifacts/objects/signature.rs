//! Author / committer signature
//!
//! The line format embedded in commits and reflogs is
//! `Name <email> <unix-seconds> <+hhmm>`.

use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Signature {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Signature {
    pub fn new(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Signature {
            name,
            email,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// "Name <email>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Git raw date: `<unix-seconds> <+hhmm>`
    pub fn raw_date(&self) -> String {
        format!(
            "{} {}",
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Full signature line as stored in commit headers and reflogs
    pub fn display(&self) -> String {
        format!("{} {}", self.display_name(), self.raw_date())
    }
}

impl TryFrom<&str> for Signature {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // split from the right: timezone, timestamp, "name <email>"
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            anyhow::bail!("invalid signature '{value}'");
        }

        let offset = parse_offset(parts[0])?;
        let seconds = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("invalid timestamp in signature '{value}'"))?;
        let name_email = parts[2];

        let email_start = name_email
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("invalid signature '{value}': missing '<'"))?;
        let email_end = name_email
            .rfind('>')
            .ok_or_else(|| anyhow::anyhow!("invalid signature '{value}': missing '>'"))?;
        if email_end < email_start {
            anyhow::bail!("invalid signature '{value}': '>' before '<'");
        }

        let name = name_email[..email_start].trim().to_string();
        let email = name_email[email_start + 1..email_end].to_string();
        let timestamp = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| anyhow::anyhow!("timestamp out of range in '{value}'"))?
            .with_timezone(&offset);

        Ok(Signature::new(name, email, timestamp))
    }
}

/// Parse a `+hhmm` / `-hhmm` offset
pub fn parse_offset(offset: &str) -> anyhow::Result<FixedOffset> {
    let invalid = || anyhow::anyhow!("invalid timezone offset '{offset}'");

    if offset.len() != 5 || !offset.is_ascii() {
        return Err(invalid());
    }
    let sign = match &offset[..1] {
        "+" => 1,
        "-" => -1,
        _ => return Err(invalid()),
    };
    let hours = offset[1..3].parse::<i32>().map_err(|_| invalid())?;
    let minutes = offset[3..5].parse::<i32>().map_err(|_| invalid())?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
