//! Decoding of raw commit objects (`git cat-file commit`) and their git-log
//! style display.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Date layout used when displaying commits
pub const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y %z";

/// Author or committer line of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<FixedOffset>,
}

impl Signature {
    /// Parses `Name <email> <unix seconds> <+hhmm>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not follow that layout.
    pub fn parse(line: &str) -> Result<Self> {
        let open = line.find('<').context("signature has no email")?;
        let close = line[open..]
            .find('>')
            .map(|i| open + i)
            .context("signature email is not terminated")?;

        let name = line[..open].trim().to_string();
        let email = line[open + 1..close].to_string();

        let mut rest = line[close + 1..].split_whitespace();
        let seconds: i64 = rest
            .next()
            .context("signature has no timestamp")?
            .parse()
            .context("invalid signature timestamp")?;
        let offset = parse_offset(rest.next().unwrap_or("+0000"))?;

        let when = DateTime::from_timestamp(seconds, 0)
            .context("signature timestamp out of range")?
            .with_timezone(&offset);

        Ok(Self { name, email, when })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A decoded commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl CommitInfo {
    /// Decodes the raw body of commit `id`.
    ///
    /// Multi-line headers (signatures, merged tags) are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a required header is missing or malformed.
    pub fn parse(id: &str, raw: &str) -> Result<Self> {
        let (headers, message) = raw.split_once("\n\n").unwrap_or((raw, ""));

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            // continuation of a multi-line header
            if line.starts_with(' ') {
                continue;
            }
            let Some((key, value)) = line.split_once(' ') else {
                continue;
            };
            match key {
                "tree" => tree = Some(value.to_string()),
                "parent" => parents.push(value.to_string()),
                "author" => author = Some(Signature::parse(value)?),
                "committer" => committer = Some(Signature::parse(value)?),
                _ => {}
            }
        }

        Ok(Self {
            id: id.to_string(),
            tree: tree.with_context(|| format!("commit {id} has no tree"))?,
            parents,
            author: author.with_context(|| format!("commit {id} has no author"))?,
            committer: committer.with_context(|| format!("commit {id} has no committer"))?,
            message: message.to_string(),
        })
    }

    /// First line of the message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

impl fmt::Display for CommitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "commit {}", self.id)?;
        if self.is_merge() {
            let short: Vec<&str> = self
                .parents
                .iter()
                .map(|p| p.get(..7).unwrap_or(p))
                .collect();
            writeln!(f, "Merge: {}", short.join(" "))?;
        }
        writeln!(f, "Author: {}", self.author)?;
        writeln!(f, "Date:   {}", self.author.when.format(DATE_FORMAT))?;
        writeln!(f)?;
        for line in self.message.trim_end_matches('\n').lines() {
            if line.is_empty() {
                writeln!(f)?;
            } else {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }
}

/// Parses a `+hhmm` / `-hhmm` timezone offset.
fn parse_offset(value: &str) -> Result<FixedOffset> {
    let (sign, digits) = match value.split_at_checked(1) {
        Some(("+", digits)) => (1, digits),
        Some(("-", digits)) => (-1, digits),
        _ => anyhow::bail!("invalid timezone offset: {value}"),
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        anyhow::bail!("invalid timezone offset: {value}");
    }
    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = digits[2..].parse()?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("timezone offset out of range: {value}"))
}
