#[cfg(test)]
pub mod fixtures {
    use crate::git::{
        CheckoutOutcome, CheckoutRequest, CloneOutcome, CommitInfo, GitError, GitProvider,
        HeadState, PullOutcome, PullRequest, RepositoryHandle,
    };
    use crate::request::{CloneRequest, RunOptions, TagMode};
    use anyhow::Result;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    pub const MAIN_COMMIT: &str = "1111111111111111111111111111111111111111";
    pub const RELEASE_COMMIT: &str = "2222222222222222222222222222222222222222";
    pub const TAG_COMMIT: &str = "3333333333333333333333333333333333333333";

    /// In-memory provider that records every call it receives.
    pub struct FakeProvider {
        /// Whether the destination already holds a clone
        pub exists: bool,
        /// Full reference name to commit id
        pub refs: RefCell<HashMap<String, String>>,
        pub head: RefCell<HeadState>,
        pub pull_outcome: PullOutcome,
        /// Calls starting with this prefix fail
        pub fail_on: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeProvider {
        /// Nothing at the destination yet.
        pub fn fresh() -> Self {
            let mut provider = Self::existing_on_main();
            provider.exists = false;
            provider
        }

        /// An existing clone on `main`, with `origin/release` and tag `v1.0`
        /// known but no local `release` branch.
        pub fn existing_on_main() -> Self {
            let refs = HashMap::from([
                ("refs/heads/main".to_string(), MAIN_COMMIT.to_string()),
                ("refs/remotes/origin/main".to_string(), MAIN_COMMIT.to_string()),
                ("refs/remotes/origin/release".to_string(), RELEASE_COMMIT.to_string()),
                ("refs/tags/v1.0".to_string(), TAG_COMMIT.to_string()),
            ]);
            Self {
                exists: true,
                refs: RefCell::new(refs),
                head: RefCell::new(HeadState {
                    reference: Some("refs/heads/main".to_string()),
                    commit: MAIN_COMMIT.to_string(),
                }),
                pull_outcome: PullOutcome::AlreadyUpToDate,
                fail_on: None,
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) -> Result<()> {
            let fails = self.fail_on.is_some_and(|prefix| call.starts_with(prefix));
            self.calls.borrow_mut().push(call.clone());
            if fails {
                return Err(GitError::Unknown(format!("{call}: scripted failure")).into());
            }
            Ok(())
        }
    }

    impl GitProvider for FakeProvider {
        fn clone_repo(&self, request: &CloneRequest) -> Result<CloneOutcome> {
            self.record("clone".to_string())?;
            if self.exists {
                Ok(CloneOutcome::AlreadyExists)
            } else {
                Ok(CloneOutcome::Cloned(RepositoryHandle::new(&request.destination)))
            }
        }

        fn open(&self, path: &Path) -> Result<RepositoryHandle> {
            self.record("open".to_string())?;
            Ok(RepositoryHandle::new(path))
        }

        fn head(&self, _repo: &RepositoryHandle) -> Result<HeadState> {
            self.record("head".to_string())?;
            Ok(self.head.borrow().clone())
        }

        fn checkout(
            &self,
            _repo: &RepositoryHandle,
            request: &CheckoutRequest<'_>,
        ) -> Result<CheckoutOutcome> {
            let full = request.target.full_name();

            if let Some(start) = &request.create {
                self.record(format!("checkout -B {full} {}", start.commit))?;
                self.refs
                    .borrow_mut()
                    .insert(full.clone(), start.commit.clone());
                *self.head.borrow_mut() = HeadState {
                    reference: Some(full),
                    commit: start.commit.clone(),
                };
                return Ok(CheckoutOutcome::Switched);
            }

            self.record(format!("checkout {full}"))?;
            let Some(commit) = self.refs.borrow().get(&full).cloned() else {
                return Ok(CheckoutOutcome::ReferenceNotFound);
            };
            *self.head.borrow_mut() = HeadState {
                reference: request.target.is_branch().then_some(full),
                commit,
            };
            Ok(CheckoutOutcome::Switched)
        }

        fn resolve_reference(
            &self,
            _repo: &RepositoryHandle,
            name: &str,
        ) -> Result<Option<String>> {
            self.record(format!("resolve {name}"))?;
            Ok(self.refs.borrow().get(name).cloned())
        }

        fn pull(&self, _repo: &RepositoryHandle, request: &PullRequest<'_>) -> Result<PullOutcome> {
            self.record(format!("pull {} {}", request.remote_name, request.reference))?;
            Ok(self.pull_outcome)
        }

        fn commit(&self, _repo: &RepositoryHandle, id: &str) -> Result<CommitInfo> {
            self.record(format!("commit {id}"))?;
            CommitInfo::parse(id, &sample_commit_body())
        }
    }

    pub fn sample_commit_body() -> String {
        "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
         author Test User <test@example.com> 1700000000 +0000\n\
         committer Test User <test@example.com> 1700000000 +0000\n\
         \n\
         Initial commit\n"
            .to_string()
    }

    /// Options for cloning a sample repository into `sample`.
    pub fn run_options(branch: Option<&str>, pull: bool) -> RunOptions {
        RunOptions {
            request: CloneRequest {
                url: "https://example.com/sample.git".to_string(),
                destination: PathBuf::from("sample"),
                remote_name: "origin".to_string(),
                reference: branch.map(|b| crate::request::RefSelector::parse(b, TagMode::All)),
                depth: None,
                single_branch: false,
                recurse_submodules: false,
                tags: TagMode::All,
                auth: None,
            },
            pull,
            show_last_commit: false,
        }
    }
}
