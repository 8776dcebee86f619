//! Local working-tree store
//!
//! One directory per repository under `<home>/repos/<name>`. The store is the
//! only component that mutates those directories; callers are expected to
//! serialize mutating calls per repository.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reporef_fs::HomeLayout;

use crate::refs;
use crate::switcher::{BranchSwitcher, SwitchOutcome};
use crate::{Error, GitCli, GitRunner, GitTimeouts, Result};

/// Whether `clone_repo` had anything to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    AlreadyPresent,
    Cloned,
}

/// What `update` did to the checked-out branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Branch that was pulled, `None` when HEAD is detached.
    pub branch: Option<String>,
    /// HEAD moved to a new commit.
    pub changed: bool,
}

/// Owns the on-disk working trees.
#[derive(Clone)]
pub struct RepoStore {
    layout: HomeLayout,
    runner: Arc<dyn GitRunner>,
    timeouts: GitTimeouts,
}

impl std::fmt::Debug for RepoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoStore")
            .field("layout", &self.layout)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl RepoStore {
    pub fn new(layout: HomeLayout, runner: Arc<dyn GitRunner>, timeouts: GitTimeouts) -> Self {
        Self {
            layout,
            runner,
            timeouts,
        }
    }

    /// Store backed by the system `git` binary.
    pub fn with_cli(layout: HomeLayout, timeouts: GitTimeouts) -> Self {
        Self::new(layout, Arc::new(GitCli::new()), timeouts)
    }

    /// Working-tree directory for `name` (may not exist yet).
    pub fn dir(&self, name: &str) -> PathBuf {
        self.layout.repo_dir(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.dir(name).exists()
    }

    fn existing_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.dir(name);
        if dir.exists() {
            Ok(dir)
        } else {
            Err(Error::RepoNotFound {
                name: name.to_string(),
            })
        }
    }

    /// Clone `url` into the working tree for `name`, then check out
    /// `default_branch` when given.
    ///
    /// An existing directory counts as success and is left alone. A failed
    /// clone removes whatever it left behind so the next attempt starts over.
    pub async fn clone_repo(
        &self,
        name: &str,
        url: &str,
        default_branch: Option<&str>,
    ) -> Result<CloneOutcome> {
        let dir = self.dir(name);
        if dir.exists() {
            tracing::debug!(repo = %name, "Repository already exists, skipping clone");
            return Ok(CloneOutcome::AlreadyPresent);
        }

        self.layout.ensure_dirs()?;
        tracing::info!(repo = %name, %url, "Cloning repository");

        let target = dir.to_string_lossy().into_owned();
        let repos_dir = self.layout.repos_dir();
        if let Err(e) = self
            .runner
            .run(
                &repos_dir,
                &["clone", "--", url, &target],
                self.timeouts.network,
            )
            .await
        {
            discard_partial_clone(&dir).await;
            return Err(Error::Clone {
                name: name.to_string(),
                message: e.to_string(),
            });
        }

        if let Some(branch) = default_branch {
            self.switch_branch(name, branch).await?;
        }

        tracing::info!(repo = %name, "Repository cloned");
        Ok(CloneOutcome::Cloned)
    }

    /// Fetch all remotes with pruning, then fast-forward the current branch.
    ///
    /// Never merges: a diverged branch fails with `UpdateConflict`.
    pub async fn update(&self, name: &str) -> Result<UpdateReport> {
        let dir = self.existing_dir(name)?;
        tracing::info!(repo = %name, "Updating repository");

        let (branch, before) = {
            let repo = refs::open(&dir)?;
            (refs::current_branch(&repo)?, refs::head_oid(&repo)?)
        };

        self.runner
            .run(&dir, &["fetch", "--all", "--prune"], self.timeouts.network)
            .await?;

        match self
            .runner
            .run(&dir, &["pull", "--ff-only"], self.timeouts.network)
            .await
        {
            Ok(_) => {}
            Err(Error::CommandFailed { stderr, .. }) if is_fast_forward_refusal(&stderr) => {
                return Err(Error::UpdateConflict {
                    name: name.to_string(),
                    message: stderr,
                });
            }
            Err(e) => return Err(e),
        }

        let after = refs::head_oid(&refs::open(&dir)?)?;
        let report = UpdateReport {
            branch,
            changed: before != after,
        };
        tracing::info!(repo = %name, branch = ?report.branch, changed = report.changed, "Repository updated");
        Ok(report)
    }

    /// Switch the working tree of `name` to `branch`.
    pub async fn switch_branch(&self, name: &str, branch: &str) -> Result<SwitchOutcome> {
        let dir = self.existing_dir(name)?;
        BranchSwitcher::new(self.runner.as_ref(), self.timeouts)
            .switch(name, &dir, branch)
            .await
    }

    /// Branch currently checked out in the working tree of `name`.
    pub fn current_branch(&self, name: &str) -> Result<Option<String>> {
        let dir = self.existing_dir(name)?;
        refs::current_branch(&refs::open(&dir)?)
    }
}

fn is_fast_forward_refusal(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("fast-forward") || lower.contains("diverg")
}

async fn discard_partial_clone(dir: &Path) {
    if dir.exists()
        && let Err(e) = tokio::fs::remove_dir_all(dir).await
    {
        tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove partial clone");
    }
}
