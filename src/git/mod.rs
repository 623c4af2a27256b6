//! # Git operations
//!
//! Everything gclone does to a repository goes through the [`GitProvider`]
//! trait. The flow only ever talks to the trait; [`cli::GitCli`] implements it
//! on top of the system `git` binary.
//!
//! Conditions the flow recovers from are part of the result type, not
//! errors:
//!
//! - [`CloneOutcome::AlreadyExists`]: the destination already holds a clone
//! - [`CheckoutOutcome::ReferenceNotFound`]: the local reference is missing
//! - [`PullOutcome::AlreadyUpToDate`]: the pull brought no new commits
//!
//! Any `Err` returned by a provider is fatal to the run.

/// Provider backed by the `git` executable
pub mod cli;

/// Commit object decoding and display
pub mod commit;

/// Git error categorization and handling
pub mod errors;

pub use commit::{CommitInfo, Signature};
pub use errors::GitError;

use crate::auth::AuthCredential;
use crate::request::{CloneRequest, RefSelector, TagMode};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Prefix of local branch references.
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A working copy the provider has cloned or opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    /// Top-level directory of the working tree
    workdir: PathBuf,
}

impl RepositoryHandle {
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Top-level directory of the working tree.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

/// Where HEAD points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadState {
    /// Symbolic reference HEAD points at; `None` when detached
    pub reference: Option<String>,
    /// Commit HEAD resolves to
    pub commit: String,
}

impl HeadState {
    /// The full branch reference, if HEAD is on a local branch.
    #[must_use]
    pub fn branch_ref(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .filter(|r| r.starts_with(BRANCH_REF_PREFIX))
    }

    /// Whether HEAD already points at the reference `full_name`.
    #[must_use]
    pub fn references(&self, full_name: &str) -> bool {
        self.reference.as_deref() == Some(full_name)
    }

    /// Human readable name: the branch without `refs/heads/`, or the
    /// reference as is for anything else.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(|r| r.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(r))
    }
}

/// Result of a clone attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    /// A fresh clone was created.
    Cloned(RepositoryHandle),
    /// The destination already contains a repository; nothing was done.
    AlreadyExists,
}

/// Result of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// HEAD now points at the requested reference.
    Switched,
    /// The requested local reference does not exist; nothing was done.
    ReferenceNotFound,
}

/// Result of a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// New commits were merged.
    Updated,
    /// The branch already contained everything upstream.
    AlreadyUpToDate,
}

/// Start point of a branch created during checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStart {
    /// Commit the new branch points at
    pub commit: String,
    /// Remote the new branch tracks
    pub remote: String,
}

/// What to check out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest<'a> {
    pub target: &'a RefSelector,
    /// Create (or reset) the branch at this start point instead of switching
    /// to an existing one
    pub create: Option<BranchStart>,
    /// Discard local changes
    pub force: bool,
}

impl<'a> CheckoutRequest<'a> {
    /// Forced switch to an existing reference.
    #[must_use]
    pub const fn switch(target: &'a RefSelector) -> Self {
        Self {
            target,
            create: None,
            force: true,
        }
    }

    /// Forced creation of a local branch tracking `start.remote`.
    #[must_use]
    pub const fn create(target: &'a RefSelector, start: BranchStart) -> Self {
        Self {
            target,
            create: Some(start),
            force: true,
        }
    }
}

/// What to pull. Mirrors the clone settings so a pull fetches the same way.
#[derive(Debug, Clone, Copy)]
pub struct PullRequest<'a> {
    pub remote_name: &'a str,
    /// Full branch reference to pull
    pub reference: &'a str,
    pub depth: Option<u32>,
    pub single_branch: bool,
    pub recurse_submodules: bool,
    pub tags: TagMode,
    pub auth: Option<&'a AuthCredential>,
}

impl<'a> PullRequest<'a> {
    /// Pull `reference` with the settings of `request`.
    #[must_use]
    pub fn from_clone(request: &'a CloneRequest, reference: &'a str) -> Self {
        Self {
            remote_name: &request.remote_name,
            reference,
            depth: request.depth,
            single_branch: request.single_branch,
            recurse_submodules: request.recurse_submodules,
            tags: request.tags,
            auth: request.auth.as_ref(),
        }
    }
}

/// The git operations gclone needs.
pub trait GitProvider {
    /// Clones `request.url` into `request.destination`.
    ///
    /// # Errors
    ///
    /// Any failure other than an existing repository at the destination.
    fn clone_repo(&self, request: &CloneRequest) -> Result<CloneOutcome>;

    /// Opens the working copy at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a git working copy.
    fn open(&self, path: &Path) -> Result<RepositoryHandle>;

    /// Reads HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be resolved to a commit.
    fn head(&self, repo: &RepositoryHandle) -> Result<HeadState>;

    /// Checks out a branch or tag.
    ///
    /// # Errors
    ///
    /// Any failure other than a missing local reference.
    fn checkout(&self, repo: &RepositoryHandle, request: &CheckoutRequest<'_>)
    -> Result<CheckoutOutcome>;

    /// Resolves a full reference name to a commit id, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn resolve_reference(&self, repo: &RepositoryHandle, name: &str) -> Result<Option<String>>;

    /// Fetches and fast-forwards the current branch.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or if the branch cannot be
    /// fast-forwarded.
    fn pull(&self, repo: &RepositoryHandle, request: &PullRequest<'_>) -> Result<PullOutcome>;

    /// Reads a commit object.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` does not name a readable commit.
    fn commit(&self, repo: &RepositoryHandle, id: &str) -> Result<CommitInfo>;
}
