//! The clone-or-open state machine.
//!
//! ```text
//! START ── clone ──> CLONED
//!   └── already exists ──> OPENED ──> BRANCH_SWITCHED ──> PULLED
//! ```
//!
//! Every provider error is fatal; there are no retries.

use crate::git::{
    BranchStart, CheckoutOutcome, CheckoutRequest, CloneOutcome, GitProvider, PullOutcome,
    PullRequest, RepositoryHandle,
};
use crate::output;
use crate::request::{CloneRequest, RefSelector, RunOptions};
use anyhow::{Context, Result};
use tracing::{debug, info_span};

/// Terminal state of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// A fresh clone was made.
    Cloned,
    /// An existing clone was opened and left as it was.
    Opened,
    /// An existing clone was switched to the requested reference.
    BranchSwitched,
    /// An existing clone was pulled.
    Pulled(PullOutcome),
}

/// What a run ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowResult {
    pub state: FlowState,
    /// The cloned or opened working copy
    pub repo: RepositoryHandle,
}

/// Clones `options.request`, or brings the existing clone at its destination
/// to the requested reference and optionally pulls it.
///
/// # Errors
///
/// Returns the first provider error, or an error if the requested branch
/// exists neither locally nor on the remote.
pub fn run<P: GitProvider + ?Sized>(provider: &P, options: &RunOptions) -> Result<FlowResult> {
    let request = &options.request;
    let span = info_span!("flow", destination = %request.destination.display());
    let _guard = span.enter();

    let outcome = provider
        .clone_repo(request)
        .with_context(|| format!("Failed to clone {}", request.url))?;
    if let CloneOutcome::Cloned(repo) = outcome {
        debug!("cloned");
        return Ok(FlowResult {
            state: FlowState::Cloned,
            repo,
        });
    }

    output::warning("Repository already exists!");
    let repo = provider.open(&request.destination).with_context(|| {
        format!(
            "Failed to open repository at {}",
            request.destination.display()
        )
    })?;
    let mut head = provider.head(&repo)?;
    output::verbose(&format!(
        "HEAD is {} at {}",
        head.display_name().unwrap_or("detached"),
        head.commit
    ));
    let mut state = FlowState::Opened;

    if let Some(target) = &request.reference
        && !head.references(&target.full_name())
    {
        switch_reference(provider, &repo, request, target)?;
        head = provider.head(&repo)?;
        state = FlowState::BranchSwitched;
    }

    if options.pull {
        match head.branch_ref() {
            Some(reference) => {
                output::action(&format!("Pull {reference}"));
                let pull = PullRequest::from_clone(request, reference);
                let outcome = provider
                    .pull(&repo, &pull)
                    .with_context(|| format!("Failed to pull {reference}"))?;

                match outcome {
                    PullOutcome::AlreadyUpToDate => output::success("Already up-to-date"),
                    PullOutcome::Updated => output::success(&format!("Updated {reference}")),
                }
                state = FlowState::Pulled(outcome);
            }
            None => output::info("HEAD is detached, nothing to pull"),
        }
    }

    Ok(FlowResult { state, repo })
}

/// Forced checkout of `target`, creating the local branch from its
/// remote-tracking branch when it does not exist yet.
fn switch_reference<P: GitProvider + ?Sized>(
    provider: &P,
    repo: &RepositoryHandle,
    request: &CloneRequest,
    target: &RefSelector,
) -> Result<()> {
    match target {
        RefSelector::Branch(name) => output::action(&format!("Checkout remote branch {name}")),
        RefSelector::Tag(name) => output::action(&format!("Checkout tag {name}")),
    }

    if provider.checkout(repo, &CheckoutRequest::switch(target))? == CheckoutOutcome::Switched {
        return Ok(());
    }

    let RefSelector::Branch(name) = target else {
        anyhow::bail!("Tag '{}' not found", target.name());
    };

    let tracking = target.remote_tracking_name(&request.remote_name);
    let commit = provider.resolve_reference(repo, &tracking)?.with_context(|| {
        format!(
            "Branch '{name}' not found locally or on remote '{}'",
            request.remote_name
        )
    })?;
    debug!(%tracking, %commit, "creating local branch");

    let start = BranchStart {
        commit,
        remote: request.remote_name.clone(),
    };
    match provider.checkout(repo, &CheckoutRequest::create(target, start))? {
        CheckoutOutcome::Switched => Ok(()),
        CheckoutOutcome::ReferenceNotFound => {
            anyhow::bail!("Failed to create branch '{name}' from {tracking}")
        }
    }
}
