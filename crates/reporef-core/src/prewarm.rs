//! Startup work: cloning, updating and cache warming
//!
//! Both entry points log failures per repository and keep going; neither
//! ever fails as a whole.

use std::sync::Arc;

use reporef_git::CloneOutcome;
use tokio::task::JoinHandle;

use crate::RepoService;

/// Per-repository result of [`initialize_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    pub repo: String,
    pub cloned: bool,
    /// The update moved the checked-out branch.
    pub changed: bool,
    /// First failure, if any. A failed clone skips the update.
    pub error: Option<String>,
}

impl InitOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Clone every configured repository that is missing, then update each one.
pub async fn initialize_all(service: &RepoService) -> Vec<InitOutcome> {
    let mut outcomes = Vec::with_capacity(service.config().repos.len());
    for repo in &service.config().repos {
        let mut outcome = InitOutcome {
            repo: repo.name.clone(),
            cloned: false,
            changed: false,
            error: None,
        };

        match service.clone_repo(&repo.name).await {
            Ok(result) => outcome.cloned = result == CloneOutcome::Cloned,
            Err(e) => {
                tracing::error!(repo = %repo.name, error = %e, "Failed to clone repository");
                outcome.error = Some(e.to_string());
                outcomes.push(outcome);
                continue;
            }
        }

        match service.update_repo(&repo.name).await {
            Ok(report) => outcome.changed = report.changed,
            Err(e) => {
                tracing::error!(repo = %repo.name, error = %e, "Failed to update repository");
                outcome.error = Some(e.to_string());
            }
        }
        outcomes.push(outcome);
    }

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    tracing::info!(
        repos = outcomes.len(),
        failed,
        "Repository initialization finished"
    );
    outcomes
}

/// Spawn a detached task that clones, updates and builds the cache for the
/// default branch of every repository.
///
/// Requests are served while this runs; the per-repository locks keep the two
/// from interleaving on one working tree.
pub fn spawn_prewarm(service: Arc<RepoService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        for repo in &service.config().repos {
            let name = repo.name.as_str();
            if let Err(e) = service.clone_repo(name).await {
                tracing::warn!(repo = %name, error = %e, "Pre-warm clone failed");
                continue;
            }
            if let Err(e) = service.update_repo(name).await {
                tracing::warn!(repo = %name, error = %e, "Pre-warm update failed");
            }
            let Some(branch) = repo.default_branch() else {
                tracing::debug!(repo = %name, "No branches configured, skipping cache");
                continue;
            };
            match service.build_cache(name, branch).await {
                Ok(files) => {
                    tracing::debug!(repo = %name, branch = %branch, files, "Pre-warmed cache");
                }
                Err(e) => {
                    tracing::warn!(repo = %name, branch = %branch, error = %e, "Pre-warm cache build failed");
                }
            }
        }
        tracing::info!("Pre-warm finished");
    })
}
