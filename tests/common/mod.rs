#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment shared by fixture git calls and the binary under test.
const GIT_ENV: [(&str, &str); 6] = [
    ("GIT_AUTHOR_NAME", "Test User"),
    ("GIT_AUTHOR_EMAIL", "test@example.com"),
    ("GIT_COMMITTER_NAME", "Test User"),
    ("GIT_COMMITTER_EMAIL", "test@example.com"),
    ("GIT_CONFIG_NOSYSTEM", "1"),
    ("GIT_TERMINAL_PROMPT", "0"),
];

/// Runs git in `dir` and returns its trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
        .args(args)
        .envs(GIT_ENV)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// A scratch area holding an upstream repository and a place to clone into.
///
/// The upstream has two commits on `main`, a `release` branch with one
/// extra commit, and tag `v1.0` on the first commit.
pub struct Sandbox {
    pub temp_dir: TempDir,
    pub upstream: PathBuf,
    pub work: PathBuf,
    pub home: PathBuf,
}

impl Sandbox {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let upstream = temp_dir.path().join("upstream");
        let work = temp_dir.path().join("work");
        let home = temp_dir.path().join("home");
        fs::create_dir_all(&upstream)?;
        fs::create_dir_all(&work)?;
        fs::create_dir_all(&home)?;

        let sandbox = Self {
            temp_dir,
            upstream,
            work,
            home,
        };

        git(&sandbox.upstream, &["init", "-q", "-b", "main"])?;
        sandbox.commit("README.md", "# sample\n", "Initial commit")?;
        git(&sandbox.upstream, &["tag", "v1.0"])?;
        sandbox.commit("src.txt", "one\n", "Add source")?;

        git(&sandbox.upstream, &["checkout", "-q", "-b", "release"])?;
        sandbox.commit("CHANGELOG.md", "1.1\n", "Prepare release")?;
        git(&sandbox.upstream, &["checkout", "-q", "main"])?;

        Ok(sandbox)
    }

    /// URL of the upstream; `file://` so that shallow clones are honored.
    pub fn url(&self) -> String {
        format!("file://{}", self.upstream.display())
    }

    /// Commits `content` to `file` on the upstream's current branch.
    pub fn commit(&self, file: &str, content: &str, message: &str) -> Result<String> {
        fs::write(self.upstream.join(file), content)?;
        git(&self.upstream, &["add", file])?;
        git(&self.upstream, &["commit", "-q", "-m", message])?;
        git(&self.upstream, &["rev-parse", "HEAD"])
    }

    /// Commits on `branch` of the upstream, leaving `main` checked out.
    pub fn commit_on(
        &self,
        branch: &str,
        file: &str,
        content: &str,
        message: &str,
    ) -> Result<String> {
        git(&self.upstream, &["checkout", "-q", branch])?;
        let id = self.commit(file, content, message);
        git(&self.upstream, &["checkout", "-q", "main"])?;
        id
    }

    /// Tags `rev` of the upstream as `name`.
    pub fn tag(&self, name: &str, rev: &str) -> Result<()> {
        git(&self.upstream, &["tag", name, rev])?;
        Ok(())
    }

    /// Where a clone without an explicit directory lands.
    pub fn clone_dir(&self) -> PathBuf {
        self.work.join("upstream")
    }

    /// The binary, run inside the work directory with no user configuration.
    pub fn gclone(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("gclone")?;
        cmd.current_dir(&self.work)
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.home.join(".config"))
            .env_remove("GCLONE_CONFIG")
            .env_remove("GCLONE_LOG")
            .env_remove("GIT_CLONE_KEY")
            .envs(GIT_ENV);
        Ok(cmd)
    }
}
