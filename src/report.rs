use crate::git::{GitProvider, RepositoryHandle};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Prints the current branch and the commit HEAD points at to `out`.
///
/// Uses `repo` when the flow produced one, otherwise opens `destination`.
/// Nothing in the repository is modified.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened, HEAD or its commit
/// cannot be read, or writing to `out` fails.
pub fn show_last_commit<P: GitProvider + ?Sized>(
    provider: &P,
    repo: Option<&RepositoryHandle>,
    destination: &Path,
    out: &mut impl Write,
) -> Result<()> {
    let opened;
    let repo = match repo {
        Some(repo) => repo,
        None => {
            opened = provider.open(destination).with_context(|| {
                format!("Failed to open repository at {}", destination.display())
            })?;
            &opened
        }
    };

    let head = provider.head(repo)?;
    let commit = provider
        .commit(repo, &head.commit)
        .with_context(|| format!("Failed to read commit {}", head.commit))?;
    debug!(commit = %commit.id, summary = commit.summary(), "last commit");

    writeln!(out)?;
    match head.display_name() {
        Some(name) => writeln!(out, "On branch {}", name.green())?,
        None => {
            let short = head.commit.get(..7).unwrap_or(&head.commit);
            writeln!(out, "HEAD detached at {short}")?;
        }
    }
    write!(out, "Show last {commit}")?;
    out.flush()?;
    Ok(())
}
