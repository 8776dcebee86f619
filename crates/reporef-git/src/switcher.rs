//! Branch switching state machine
//!
//! Nothing about the checked-out branch is remembered between calls: every
//! switch re-reads `HEAD` from disk and decides from there.
//!
//! ```text
//! resolve HEAD ──same──> AlreadyCurrent            (no fetch, no mutation)
//!      │
//!    differs
//!      v
//! fetch --all --prune, inspect refs
//!      ├─ local exists  ──> checkout -f <b>; clean -f -X; reset --hard HEAD
//!      ├─ remote only   ──> checkout -f --track origin/<b>; clean -f -d
//!      └─ neither       ──> BranchNotFound      (tree untouched)
//! ```

use std::path::Path;

use crate::refs::{self, ORIGIN};
use crate::{Error, GitRunner, GitTimeouts, Result};

/// What a switch request resolves to once refs are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPlan {
    AlreadyCurrent,
    CheckoutLocal,
    TrackRemote,
    Missing,
}

impl SwitchPlan {
    /// Short-circuit before any fetch when HEAD already names the target.
    pub fn from_head(current: Option<&str>, target: &str) -> Option<Self> {
        (current == Some(target)).then_some(Self::AlreadyCurrent)
    }

    /// Decide from ref existence after fetching. A local branch always wins
    /// over creating a tracking branch, even when it has diverged.
    pub fn from_refs(local_exists: bool, remote_exists: bool) -> Self {
        match (local_exists, remote_exists) {
            (true, _) => Self::CheckoutLocal,
            (false, true) => Self::TrackRemote,
            (false, false) => Self::Missing,
        }
    }
}

/// Result of a successful switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    AlreadyCurrent,
    CheckedOutLocal,
    CreatedTracking,
}

/// Performs destructive branch switches on a single working tree.
///
/// Working trees are read-only mirrors of upstream content, so local
/// modifications are discarded without warning.
pub struct BranchSwitcher<'a> {
    runner: &'a dyn GitRunner,
    timeouts: GitTimeouts,
}

impl<'a> BranchSwitcher<'a> {
    pub fn new(runner: &'a dyn GitRunner, timeouts: GitTimeouts) -> Self {
        Self { runner, timeouts }
    }

    /// Bring the working tree at `dir` onto `target`.
    ///
    /// `repo_name` is only used for error reporting.
    pub async fn switch(&self, repo_name: &str, dir: &Path, target: &str) -> Result<SwitchOutcome> {
        let current = refs::current_branch(&refs::open(dir)?)?;
        if SwitchPlan::from_head(current.as_deref(), target).is_some() {
            tracing::debug!(repo = %repo_name, branch = %target, "Already on branch");
            return Ok(SwitchOutcome::AlreadyCurrent);
        }

        self.runner
            .run(dir, &["fetch", "--all", "--prune"], self.timeouts.network)
            .await?;

        let plan = {
            let repo = refs::open(dir)?;
            SwitchPlan::from_refs(
                refs::local_branch_exists(&repo, target),
                refs::remote_branch_exists(&repo, target),
            )
        };

        let outcome = match plan {
            SwitchPlan::CheckoutLocal => {
                self.local(dir, &["checkout", "-f", target]).await?;
                self.local(dir, &["clean", "-f", "-X"]).await?;
                self.local(dir, &["reset", "--hard", "HEAD"]).await?;
                SwitchOutcome::CheckedOutLocal
            }
            SwitchPlan::TrackRemote => {
                let remote_ref = format!("{ORIGIN}/{target}");
                self.local(dir, &["checkout", "-f", "--track", &remote_ref])
                    .await?;
                self.local(dir, &["clean", "-f", "-d"]).await?;
                SwitchOutcome::CreatedTracking
            }
            SwitchPlan::Missing => {
                return Err(Error::BranchNotFound {
                    repo: repo_name.to_string(),
                    branch: target.to_string(),
                });
            }
            SwitchPlan::AlreadyCurrent => SwitchOutcome::AlreadyCurrent,
        };

        tracing::info!(
            repo = %repo_name,
            from = current.as_deref().unwrap_or("(detached)"),
            branch = %target,
            ?outcome,
            "Switched branch"
        );
        Ok(outcome)
    }

    async fn local(&self, dir: &Path, args: &[&str]) -> Result<String> {
        self.runner.run(dir, args, self.timeouts.local).await
    }
}
