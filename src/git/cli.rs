//! [`GitProvider`] on top of the `git` executable.
//!
//! Network operations (clone, pull) stream git's progress to stdout through a
//! [`ProgressRelay`]; everything else captures output. Failures are turned
//! into a categorized [`GitError`] from git's stderr.

use super::{
    CheckoutOutcome, CheckoutRequest, CloneOutcome, CommitInfo, GitError, GitProvider, HeadState,
    PullOutcome, PullRequest, RepositoryHandle,
};
use crate::auth::AuthCredential;
use crate::output::ProgressRelay;
use crate::request::{CloneRequest, RefSelector, TagMode};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{Level, debug, span};

/// Runs git operations by spawning the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    /// Path of the git executable
    program: PathBuf,
    /// Whether clone and pull show progress
    progress: bool,
}

impl GitCli {
    /// Locates `git` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if no git executable can be found.
    pub fn new(progress: bool) -> Result<Self> {
        let program = which::which("git").context("git executable not found in PATH")?;
        debug!(program = %program.display(), "found git");
        Ok(Self::with_program(program, progress))
    }

    /// Uses the given git executable.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>, progress: bool) -> Self {
        Self {
            program: program.into(),
            progress,
        }
    }

    /// Base command: optional working directory, identity, no prompts.
    fn command(&self, dir: Option<&Path>, auth: Option<&AuthCredential>) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.env("GIT_TERMINAL_PROMPT", "0").stdin(Stdio::null());
        if let Some(auth) = auth {
            debug!(key = %auth.key_path().display(), inline = auth.is_inline(), "using identity");
            for (key, value) in auth.git_env() {
                cmd.env(key, value);
            }
        }
        cmd
    }

    /// Runs a local command in `repo` and captures its output.
    fn output(&self, repo: &RepositoryHandle, args: &[&str]) -> Result<Output> {
        let span = span!(Level::DEBUG, "git", args = %args.join(" "));
        let _guard = span.enter();

        let output = self
            .command(Some(repo.workdir()), None)
            .args(args)
            .output()
            .with_context(|| format!("Failed to run git {}", args.first().unwrap_or(&"")))?;

        debug!(status = %output.status, "git finished");
        Ok(output)
    }

    /// Runs a local command that must succeed; returns trimmed stdout.
    fn run(&self, repo: &RepositoryHandle, args: &[&str]) -> Result<String> {
        let output = self.output(repo, args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let label = format!("git {}", args.first().unwrap_or(&""));
            return Err(GitError::from_stderr(&label, &stderr).into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Runs a network command, relaying its progress stream.
    fn run_with_progress(&self, mut cmd: Command, label: &str) -> Result<()> {
        let span = span!(Level::DEBUG, "git", command = label);
        let _guard = span.enter();
        debug!(?cmd, "spawning");

        let mut child = cmd
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {label}"))?;

        let mut relay = ProgressRelay::stdout(self.progress);
        if let Some(stderr) = child.stderr.take()
            && let Err(e) = relay.pump(stderr)
        {
            // reap the child before reporting
            let _ = child.kill();
            let _ = child.wait();
            return Err(e).with_context(|| format!("Failed to read output of {label}"));
        }

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {label}"))?;
        debug!(%status, "git finished");

        if !status.success() {
            return Err(GitError::from_stderr(label, &relay.captured()).into());
        }
        Ok(())
    }
}

/// Progress switch shared by clone and pull.
const fn progress_flag(progress: bool) -> &'static str {
    if progress { "--progress" } else { "--quiet" }
}

/// Arguments of `git clone` for `request`.
fn clone_args(request: &CloneRequest, progress: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "clone".into(),
        "--origin".into(),
        request.remote_name.clone().into(),
    ];

    if let Some(reference) = &request.reference {
        args.push("--branch".into());
        args.push(reference.name().into());
    }

    if let Some(depth) = request.depth {
        args.push("--depth".into());
        args.push(depth.to_string().into());
        // --depth implies --single-branch in git; only the flag should decide
        if !request.single_branch {
            args.push("--no-single-branch".into());
        }
    }
    if request.single_branch {
        args.push("--single-branch".into());
    }

    if request.recurse_submodules {
        args.push("--recurse-submodules".into());
    }

    match request.tags {
        TagMode::All => {
            args.push("--config".into());
            args.push(format!("remote.{}.tagOpt=--tags", request.remote_name).into());
        }
        TagMode::No => args.push("--no-tags".into()),
        TagMode::Following => {}
    }

    args.push(progress_flag(progress).into());
    args.push("--".into());
    args.push(request.url.clone().into());
    args.push(request.destination.clone().into_os_string());
    args
}

/// Arguments of a `git fetch` of the remote's configured refspecs.
fn fetch_args(remote: &str, depth: Option<u32>, tags: TagMode, progress: bool) -> Vec<String> {
    let mut args = vec!["fetch".to_string()];

    if let Some(depth) = depth {
        args.push(format!("--depth={depth}"));
    }
    match tags {
        TagMode::All => args.push("--tags".to_string()),
        TagMode::No => args.push("--no-tags".to_string()),
        TagMode::Following => {}
    }

    args.push(progress_flag(progress).to_string());
    args.push(remote.to_string());
    args
}

/// Arguments of `git pull` for `request`.
fn pull_args(request: &PullRequest<'_>, progress: bool) -> Vec<String> {
    let mut args = vec!["pull".to_string(), "--ff-only".to_string()];

    if let Some(depth) = request.depth {
        args.push(format!("--depth={depth}"));
    }
    if request.recurse_submodules {
        args.push("--recurse-submodules".to_string());
    }
    match request.tags {
        TagMode::All => args.push("--tags".to_string()),
        TagMode::No => args.push("--no-tags".to_string()),
        TagMode::Following => {}
    }

    args.push(progress_flag(progress).to_string());
    args.push(request.remote_name.to_string());
    args.push(request.reference.to_string());
    args
}

impl GitProvider for GitCli {
    fn clone_repo(&self, request: &CloneRequest) -> Result<CloneOutcome> {
        let destination = &request.destination;
        if destination.join(".git").exists() {
            debug!(destination = %destination.display(), "repository already exists");
            return Ok(CloneOutcome::AlreadyExists);
        }

        let mut cmd = self.command(None, request.auth.as_ref());
        cmd.args(clone_args(request, self.progress));
        self.run_with_progress(cmd, "git clone")?;

        // clone itself only follows tags that point into the fetched history
        if request.tags == TagMode::All {
            let mut cmd = self.command(Some(destination), request.auth.as_ref());
            cmd.args(fetch_args(
                &request.remote_name,
                request.depth,
                TagMode::All,
                self.progress,
            ));
            self.run_with_progress(cmd, "git fetch")?;
        }

        Ok(CloneOutcome::Cloned(RepositoryHandle::new(destination)))
    }

    fn open(&self, path: &Path) -> Result<RepositoryHandle> {
        if !path.join(".git").exists() {
            return Err(GitError::NotFound(format!(
                "repository does not exist: {}",
                path.display()
            ))
            .into());
        }

        let repo = RepositoryHandle::new(path);
        let inside = self.run(&repo, &["rev-parse", "--is-inside-work-tree"])?;
        if inside != "true" {
            anyhow::bail!("{} is not a git working tree", path.display());
        }
        Ok(repo)
    }

    fn head(&self, repo: &RepositoryHandle) -> Result<HeadState> {
        let symbolic = self.output(repo, &["symbolic-ref", "-q", "HEAD"])?;
        let reference = match symbolic.status.code() {
            Some(0) => Some(String::from_utf8_lossy(&symbolic.stdout).trim().to_string()),
            // detached
            Some(1) => None,
            _ => {
                let stderr = String::from_utf8_lossy(&symbolic.stderr);
                return Err(GitError::from_stderr("git symbolic-ref", &stderr).into());
            }
        };

        let commit = self.resolve_reference(repo, "HEAD")?.with_context(|| {
            format!(
                "HEAD of {} does not point to a commit",
                repo.workdir().display()
            )
        })?;

        Ok(HeadState { reference, commit })
    }

    fn checkout(
        &self,
        repo: &RepositoryHandle,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutOutcome> {
        let force = if request.force { "--force" } else { "" };
        let full_name = request.target.full_name();

        match (&request.create, request.target) {
            (Some(start), RefSelector::Branch(name)) => {
                let args: Vec<&str> = [
                    "checkout",
                    force,
                    "-B",
                    name.as_str(),
                    start.commit.as_str(),
                    "--",
                ]
                .into_iter()
                .filter(|a| !a.is_empty())
                .collect();
                self.run(repo, &args)?;

                let remote_key = format!("branch.{name}.remote");
                let merge_key = format!("branch.{name}.merge");
                self.run(repo, &["config", &remote_key, &start.remote])?;
                self.run(repo, &["config", &merge_key, &full_name])?;
                Ok(CheckoutOutcome::Switched)
            }
            (Some(_), RefSelector::Tag(name)) => {
                anyhow::bail!("cannot create tag '{name}' by checking it out")
            }
            (None, target) => {
                if self.resolve_reference(repo, &full_name)?.is_none() {
                    debug!(reference = %full_name, "reference not found");
                    return Ok(CheckoutOutcome::ReferenceNotFound);
                }

                let args: Vec<&str> = match target {
                    RefSelector::Branch(name) => vec!["checkout", force, name.as_str(), "--"],
                    RefSelector::Tag(_) => {
                        vec!["checkout", force, "--detach", full_name.as_str(), "--"]
                    }
                };
                let args: Vec<&str> = args.into_iter().filter(|a| !a.is_empty()).collect();
                self.run(repo, &args)?;
                Ok(CheckoutOutcome::Switched)
            }
        }
    }

    fn resolve_reference(&self, repo: &RepositoryHandle, name: &str) -> Result<Option<String>> {
        let spec = format!("{name}^{{commit}}");
        let output = self.output(repo, &["rev-parse", "--verify", "--quiet", &spec])?;

        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()));
        }

        // --quiet exits silently when the name does not resolve
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.trim().is_empty() {
            Ok(None)
        } else {
            Err(GitError::from_stderr("git rev-parse", &stderr).into())
        }
    }

    fn pull(&self, repo: &RepositoryHandle, request: &PullRequest<'_>) -> Result<PullOutcome> {
        let before = self.head(repo)?.commit;

        // refresh every remote-tracking branch, not only the pulled one
        if !request.single_branch {
            let mut cmd = self.command(Some(repo.workdir()), request.auth);
            cmd.args(fetch_args(
                request.remote_name,
                request.depth,
                request.tags,
                self.progress,
            ));
            self.run_with_progress(cmd, "git fetch")?;
        }

        let mut cmd = self.command(Some(repo.workdir()), request.auth);
        cmd.args(pull_args(request, self.progress));
        self.run_with_progress(cmd, "git pull")?;

        let after = self.head(repo)?.commit;
        if before == after {
            Ok(PullOutcome::AlreadyUpToDate)
        } else {
            Ok(PullOutcome::Updated)
        }
    }

    fn commit(&self, repo: &RepositoryHandle, id: &str) -> Result<CommitInfo> {
        let output = self.output(repo, &["cat-file", "commit", id])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::from_stderr("git cat-file", &stderr).into());
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        CommitInfo::parse(id, &raw)
    }
}
