//! Command-line interface definitions for gclone.
//!
//! The CLI definitions are shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation doubles as clap help text, so we allow
//! missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use crate::request::TagMode;
use clap::Parser;
use std::path::PathBuf;

/// Main CLI structure for gclone.
#[derive(Parser, Debug)]
#[command(
    name = "gclone",
    version = crate::VERSION,
    about = "Clone a repository, or update an existing clone of it",
    long_about = "Clones a repository into a new directory. If the directory already holds \
                  a clone, switches it to the requested branch and optionally pulls."
)]
pub struct Cli {
    /// The repository to clone from.
    #[arg(value_name = "repository")]
    pub repository: String,

    /// The name of a new directory to clone into.
    #[arg(value_name = "directory")]
    pub directory: Option<PathBuf>,

    /// Selects a file from which the identity (private key) for public key ssh
    /// authentication is read. Or use the environment variable.
    #[arg(
        short,
        long,
        value_name = "file",
        env = crate::IDENTITY_ENV,
        hide_env_values = true
    )]
    pub identity: Option<String>,

    /// After the clone is created, initialize all submodules within, using their default settings.
    #[arg(short, long)]
    pub recursive: bool,

    /// Incorporates changes from a remote repository into the current branch (if already cloned).
    #[arg(short, long)]
    pub pull: bool,

    /// Instead of using the remote name origin to keep track of the upstream repository, use <name>.
    #[arg(short = 'o', long = "origin", value_name = "name")]
    pub remote_name: Option<String>,

    /// Instead of pointing the newly created HEAD to the branch pointed to by the cloned
    /// repository's HEAD, point to <name> branch instead.
    ///
    /// If the repository is already cloned, it will simply switch the branch, and local
    /// changes will be discarded. Use tags/<name> to select a tag.
    #[arg(short, long, value_name = "name")]
    pub branch: Option<String>,

    /// Clone only the history leading to the tip of a single branch, either specified by the
    /// --branch option or the primary branch remote's HEAD points at.
    #[arg(long)]
    pub single_branch: bool,

    /// Create a shallow clone with a history truncated to the specified number of commits.
    /// Zero or a negative value means full history.
    #[arg(short, long, value_name = "depth", allow_negative_numbers = true)]
    pub depth: Option<i64>,

    /// Tag mode [default: all]
    #[arg(short, long, value_enum, value_name = "mode")]
    pub tags: Option<TagMode>,

    /// Print the latest commit.
    #[arg(short = 'l', long = "last")]
    pub last_commit: bool,

    /// Read defaults from this configuration file
    #[arg(long, value_name = "file", env = crate::CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages and progress
    #[arg(short, long)]
    pub quiet: bool,
}
