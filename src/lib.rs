#![warn(missing_docs)]

//! # gclone - clone, or bring an existing clone up to date
//!
//! `gclone` wraps the system `git` binary behind a single idempotent command:
//! the first run clones a repository, later runs against the same directory
//! open the existing checkout, switch it to the requested branch and
//! optionally pull.
//!
//! ## Architecture
//!
//! - [`cli`]: clap definitions of the command line
//! - [`config`]: optional TOML file supplying defaults
//! - [`request`]: argument resolution into an immutable [`request::RunOptions`]
//! - [`auth`]: identity (SSH private key) resolution
//! - [`git`]: the [`git::GitProvider`] abstraction and its `git` binary backend
//! - [`flow`]: the clone-or-open state machine
//! - [`report`]: printing the current branch and last commit
//! - [`output`]: colored console messages and progress relay
//! - [`logging`]: tracing subscriber setup
//!
//! ## Example Usage
//!
//! ```no_run
//! use clap::Parser;
//! use gclone::cli::Cli;
//! use gclone::config::Config;
//! use gclone::git::cli::GitCli;
//! use gclone::request::RunOptions;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cli = Cli::parse_from(["gclone", "https://example.com/sample.git", "--pull"]);
//! let options = RunOptions::from_cli(&cli, &Config::default())?;
//! let provider = GitCli::new(true)?;
//! let result = gclone::flow::run(&provider, &options)?;
//! println!("{:?}", result.state);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Configuration file parsing and validation.
pub mod config;

/// Resolution of command-line arguments into an immutable request.
pub mod request;

/// Identity resolution for SSH public key authentication.
pub mod auth;

/// Git operations provider abstraction and implementation.
pub mod git;

/// Clone-or-open flow.
pub mod flow;

/// Reporting of HEAD state.
pub mod report;

/// Output formatting and progress display.
pub mod output;

/// Logging setup.
pub mod logging;

/// Current version of the gclone binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that may carry the identity (key file path or key material).
pub const IDENTITY_ENV: &str = "GIT_CLONE_KEY";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "GCLONE_CONFIG";

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "GCLONE_LOG";

/// Configuration file path relative to the platform configuration directory.
pub const DEFAULT_CONFIG_PATH: &str = "gclone/config.toml";

/// Remote name used when neither the command line nor the config names one.
pub const DEFAULT_REMOTE_NAME: &str = "origin";

#[cfg(test)]
mod test_utils;
