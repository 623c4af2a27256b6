//! Argument resolution.
//!
//! Turns parsed command-line flags (plus configuration defaults) into a
//! [`CloneRequest`] and the [`RunOptions`] that drive the flow. Everything in
//! here is built once at startup and never mutated afterwards.

use crate::auth::AuthCredential;
use crate::cli::Cli;
use crate::config::Config;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Prefix that turns a `--branch` value into a tag selection.
pub const TAG_SELECTOR_PREFIX: &str = "tags/";

/// Which tags are fetched alongside the requested history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// Fetch every tag of the remote.
    #[default]
    All,
    /// Fetch no tags at all.
    No,
    /// Fetch only tags pointing into the fetched history.
    Following,
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::No => "no",
            Self::Following => "following",
        };
        f.write_str(name)
    }
}

/// The reference a user asked to check out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSelector {
    /// A branch, by short name (`main`, `feature/x`).
    Branch(String),
    /// A tag, by short name (`v1.0`).
    Tag(String),
}

impl RefSelector {
    /// Interprets a `--branch` value.
    ///
    /// `tags/<name>` selects the tag `<name>` unless tags are disabled, in
    /// which case the whole value is taken as a branch name.
    #[must_use]
    pub fn parse(value: &str, tags: TagMode) -> Self {
        match value.strip_prefix(TAG_SELECTOR_PREFIX) {
            Some(tag) if tags != TagMode::No => Self::Tag(tag.to_string()),
            _ => Self::Branch(value.to_string()),
        }
    }

    /// Short name, as passed to `git clone --branch`.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Branch(name) | Self::Tag(name) => name,
        }
    }

    /// Fully qualified reference name.
    #[must_use]
    pub fn full_name(&self) -> String {
        match self {
            Self::Branch(name) => format!("refs/heads/{name}"),
            Self::Tag(name) => format!("refs/tags/{name}"),
        }
    }

    /// Remote-tracking reference for this name under `remote`.
    #[must_use]
    pub fn remote_tracking_name(&self, remote: &str) -> String {
        format!("refs/remotes/{remote}/{}", self.name())
    }

    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }
}

impl fmt::Display for RefSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Everything needed to clone, or to bring an existing clone up to date.
#[derive(Debug)]
pub struct CloneRequest {
    /// Repository URL (any form `git clone` accepts).
    pub url: String,
    /// Working directory of the clone.
    pub destination: PathBuf,
    /// Name of the remote tracking the upstream repository.
    pub remote_name: String,
    /// Branch or tag to check out, if one was requested.
    pub reference: Option<RefSelector>,
    /// History depth; `None` is the full history.
    pub depth: Option<u32>,
    pub single_branch: bool,
    pub recurse_submodules: bool,
    pub tags: TagMode,
    /// Identity used for SSH transports.
    pub auth: Option<AuthCredential>,
}

/// The full configuration of one invocation.
#[derive(Debug)]
pub struct RunOptions {
    /// What to clone and how.
    pub request: CloneRequest,
    /// Pull when the destination already holds a clone.
    pub pull: bool,
    /// Print the current branch and last commit when done.
    pub show_last_commit: bool,
}

impl RunOptions {
    /// Builds the options for one run.
    ///
    /// Flags win over the configuration file, which wins over built-in
    /// defaults. The identity, if any, is resolved here, so this reads the key
    /// file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if no destination can be derived, the remote name is
    /// empty, or the identity cannot be loaded.
    pub fn from_cli(cli: &Cli, config: &Config) -> Result<Self> {
        let defaults = &config.defaults;

        let destination = match &cli.directory {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => derive_destination(&cli.repository)?,
        };

        let remote_name = cli
            .remote_name
            .clone()
            .unwrap_or_else(|| defaults.origin.clone());
        if remote_name.trim().is_empty() {
            anyhow::bail!("Remote name must not be empty");
        }

        let tags = cli.tags.unwrap_or(defaults.tags);
        let reference = cli
            .branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(|b| RefSelector::parse(b, tags));

        let identity = cli
            .identity
            .as_deref()
            .or(defaults.identity.as_deref())
            .filter(|i| !i.is_empty());
        let auth = identity
            .map(AuthCredential::resolve)
            .transpose()
            .context("Failed to set up authentication")?;

        let request = CloneRequest {
            url: cli.repository.clone(),
            destination,
            remote_name,
            reference,
            depth: history_depth(cli.depth.unwrap_or(defaults.depth)),
            single_branch: cli.single_branch || defaults.single_branch,
            recurse_submodules: cli.recursive || defaults.recursive,
            tags,
            auth,
        };

        Ok(Self {
            request,
            pull: cli.pull,
            show_last_commit: cli.last_commit,
        })
    }
}

/// Maps a user supplied depth to a history limit; zero and below mean no limit.
#[must_use]
pub fn history_depth(depth: i64) -> Option<u32> {
    if depth <= 0 {
        None
    } else {
        Some(u32::try_from(depth).unwrap_or(u32::MAX))
    }
}

/// Derives the clone directory from a repository URL: the last path segment
/// with a trailing `.git` removed.
///
/// Works for URLs (`https://host/org/repo.git`), scp-like addresses
/// (`git@host:repo.git`) and local paths. Trailing slashes are ignored.
///
/// # Errors
///
/// Returns an error if the URL has no usable last segment.
pub fn derive_destination(url: &str) -> Result<PathBuf> {
    let trimmed = url.trim_end_matches(['/', '\\']);
    let segment = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    // scp-like address without a path: git@host:repo.git
    let segment = if trimmed.contains("://") {
        segment
    } else {
        segment.rsplit(':').next().unwrap_or(segment)
    };
    let name = segment.strip_suffix(".git").unwrap_or(segment);

    if name.is_empty() || name == "." || name == ".." {
        anyhow::bail!(
            "Cannot derive a directory name from '{url}'; pass <directory> explicitly"
        );
    }

    Ok(PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use proptest::prelude::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["gclone"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[rstest]
    #[case("https://example.com/sample.git", "sample")]
    #[case("https://example.com/org/sample", "sample")]
    #[case("https://example.com/org/sample.git/", "sample")]
    #[case("ssh://git@example.com:2222/org/tool.git", "tool")]
    #[case("git@example.com:org/tool.git", "tool")]
    #[case("git@example.com:tool.git", "tool")]
    #[case("/srv/repos/project.git", "project")]
    #[case("../relative/project", "project")]
    #[case("file:///srv/repos/archive.tar.git", "archive.tar")]
    fn test_derive_destination(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(derive_destination(url).unwrap(), PathBuf::from(expected));
    }

    #[rstest]
    #[case("https://example.com/.git")]
    #[case("/")]
    #[case("..")]
    fn test_derive_destination_rejects_empty_names(#[case] url: &str) {
        assert!(derive_destination(url).is_err());
    }

    #[rstest]
    #[case(0, None)]
    #[case(-3, None)]
    #[case(1, Some(1))]
    #[case(50, Some(50))]
    #[case(i64::MAX, Some(u32::MAX))]
    fn test_history_depth(#[case] depth: i64, #[case] expected: Option<u32>) {
        assert_eq!(history_depth(depth), expected);
    }

    #[test]
    fn test_tag_prefix_selects_tag() {
        let selector = RefSelector::parse("tags/v1.2", TagMode::All);
        assert_eq!(selector, RefSelector::Tag("v1.2".to_string()));
        assert_eq!(selector.full_name(), "refs/tags/v1.2");
        assert_eq!(selector.name(), "v1.2");

        let following = RefSelector::parse("tags/v1.2", TagMode::Following);
        assert_eq!(following, RefSelector::Tag("v1.2".to_string()));
    }

    #[test]
    fn test_tag_prefix_is_a_branch_without_tags() {
        let selector = RefSelector::parse("tags/v1.2", TagMode::No);
        assert_eq!(selector, RefSelector::Branch("tags/v1.2".to_string()));
        assert_eq!(selector.full_name(), "refs/heads/tags/v1.2");
    }

    #[test]
    fn test_branch_selector_names() {
        let selector = RefSelector::parse("feature/login", TagMode::All);
        assert!(selector.is_branch());
        assert_eq!(selector.full_name(), "refs/heads/feature/login");
        assert_eq!(
            selector.remote_tracking_name("upstream"),
            "refs/remotes/upstream/feature/login"
        );
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = parse(&["https://example.com/sample.git"]);
        let options = RunOptions::from_cli(&cli, &Config::default()).unwrap();
        let request = &options.request;

        assert_eq!(request.destination, PathBuf::from("sample"));
        assert_eq!(request.remote_name, "origin");
        assert_eq!(request.reference, None);
        assert_eq!(request.depth, None);
        assert_eq!(request.tags, TagMode::All);
        assert!(!request.single_branch);
        assert!(!request.recurse_submodules);
        assert!(!options.pull);
        assert!(!options.show_last_commit);
    }

    #[test]
    fn test_explicit_directory_wins() {
        let cli = parse(&["https://example.com/sample.git", "work/copy"]);
        let options = RunOptions::from_cli(&cli, &Config::default()).unwrap();
        assert_eq!(options.request.destination, PathBuf::from("work/copy"));
    }

    #[test]
    fn test_depth_zero_equals_no_depth() {
        let with_zero = parse(&["https://example.com/sample.git", "--depth", "0"]);
        let without = parse(&["https://example.com/sample.git"]);

        let a = RunOptions::from_cli(&with_zero, &Config::default()).unwrap();
        let b = RunOptions::from_cli(&without, &Config::default()).unwrap();
        assert_eq!(a.request.depth, b.request.depth);
        assert_eq!(a.request.depth, None);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.defaults.origin = "upstream".to_string();
        config.defaults.tags = TagMode::No;
        config.defaults.depth = 10;
        config.defaults.recursive = true;

        let cli = parse(&[
            "https://example.com/sample.git",
            "-o",
            "mirror",
            "-t",
            "following",
            "-d",
            "2",
            "-b",
            "tags/v1",
        ]);
        let options = RunOptions::from_cli(&cli, &config).unwrap();
        let request = &options.request;

        assert_eq!(request.remote_name, "mirror");
        assert_eq!(request.tags, TagMode::Following);
        assert_eq!(request.depth, Some(2));
        assert!(request.recurse_submodules);
        assert_eq!(request.reference, Some(RefSelector::Tag("v1".to_string())));
    }

    #[test]
    fn test_config_defaults_apply() {
        let mut config = Config::default();
        config.defaults.origin = "upstream".to_string();
        config.defaults.single_branch = true;

        let cli = parse(&["https://example.com/sample.git"]);
        let options = RunOptions::from_cli(&cli, &config).unwrap();
        assert_eq!(options.request.remote_name, "upstream");
        assert!(options.request.single_branch);
    }

    #[test]
    fn test_empty_branch_is_ignored() {
        let cli = parse(&["https://example.com/sample.git", "--branch", ""]);
        let options = RunOptions::from_cli(&cli, &Config::default()).unwrap();
        assert_eq!(options.request.reference, None);
    }

    #[test]
    fn test_empty_remote_name_is_rejected() {
        let cli = parse(&["https://example.com/sample.git", "--origin", ""]);
        assert!(RunOptions::from_cli(&cli, &Config::default()).is_err());
    }

    #[test]
    fn test_missing_identity_file_fails() {
        let cli = parse(&[
            "https://example.com/sample.git",
            "--identity",
            "/nonexistent/gclone/id_rsa",
        ]);
        let err = RunOptions::from_cli(&cli, &Config::default()).unwrap_err();
        assert!(format!("{err:#}").contains("authentication"));
    }

    proptest! {
        #[test]
        fn prop_destination_is_last_segment(
            host in "[a-z]{1,10}\\.(com|org)",
            org in "[a-zA-Z0-9_-]{1,12}",
            name in "[a-zA-Z0-9_-]{1,20}",
            suffix in prop::bool::ANY,
        ) {
            let url = if suffix {
                format!("https://{host}/{org}/{name}.git")
            } else {
                format!("https://{host}/{org}/{name}")
            };
            prop_assert_eq!(derive_destination(&url).unwrap(), PathBuf::from(&name));
        }
    }
}
