//! Request-level facade over configuration, working trees and the path cache
//!
//! Every request that needs a branch goes through [`RepoService::checkout`]:
//!
//! 1. take the repository read lock; if `HEAD` already names the branch, serve
//!    under it alongside other readers;
//! 2. otherwise release it, take the write lock, clone if missing and switch,
//!    then downgrade to a read lock and serve.
//!
//! A reader therefore never sees a tree mid-switch or on another branch.

use std::collections::BTreeMap;
use std::sync::Arc;

use reporef_git::{CloneOutcome, RepoStore, UpdateReport};
use serde::Serialize;
use tokio::sync::OwnedRwLockReadGuard;

use crate::browse::{self, HintFile};
use crate::cache::{CacheKey, PathCache};
use crate::config::{Config, RepositoryDescriptor};
use crate::locks::RepoLocks;
use crate::search::{SearchMatcher, SearchResult};
use crate::{Error, Result};

/// Directory listing with the hint files found along its path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileList {
    pub path: String,
    pub entries: Vec<String>,
    pub prompts: Vec<HintFile>,
}

/// File text with the hint files found along its path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
    pub prompts: Vec<HintFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshedKey {
    pub key: String,
    pub files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedKey {
    pub key: String,
    pub error: String,
}

/// Outcome of a cache refresh, one line per `(repo, branch)` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub refreshed: Vec<RefreshedKey>,
    pub failed: Vec<FailedKey>,
}

#[derive(Debug)]
pub struct RepoService {
    config: Arc<Config>,
    store: RepoStore,
    cache: PathCache,
    locks: RepoLocks,
}

impl RepoService {
    pub fn new(config: Config, store: RepoStore) -> Self {
        Self {
            config: Arc::new(config),
            cache: PathCache::new(store.clone()),
            store,
            locks: RepoLocks::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &RepoStore {
        &self.store
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    /// Look a repository up by name or alias.
    pub fn repository(&self, ident: &str) -> Result<&RepositoryDescriptor> {
        self.config.find(ident).ok_or_else(|| Error::RepoNotFound {
            name: ident.to_string(),
        })
    }

    /// Look a repository up and check `branch` is one of its configured
    /// branches. Runs before any git work.
    fn resolve(&self, ident: &str, branch: &str) -> Result<&RepositoryDescriptor> {
        let repo = self.repository(ident)?;
        if repo.branch(branch).is_none() {
            return Err(Error::BranchNotFound {
                repo: repo.name.clone(),
                branch: branch.to_string(),
                available: repo.branch_names().iter().map(|b| b.to_string()).collect(),
            });
        }
        Ok(repo)
    }

    /// Put `repo` on `branch` and hold it there for the guard's lifetime.
    async fn checkout(
        &self,
        repo: &RepositoryDescriptor,
        branch: &str,
    ) -> Result<OwnedRwLockReadGuard<()>> {
        let read = self.locks.read(&repo.name).await;
        if self.store.exists(&repo.name)
            && self.store.current_branch(&repo.name)?.as_deref() == Some(branch)
        {
            return Ok(read);
        }
        drop(read);

        let write = self.locks.write(&repo.name).await;
        self.ensure_cloned(repo).await?;
        self.store
            .switch_branch(&repo.name, branch)
            .await
            .map_err(|e| Error::from_git(e, &repo.branch_names()))?;
        Ok(write.downgrade())
    }

    /// Clone when the working tree is missing. Caller holds the write lock.
    async fn ensure_cloned(&self, repo: &RepositoryDescriptor) -> Result<CloneOutcome> {
        self.store
            .clone_repo(&repo.name, &repo.url, repo.default_branch())
            .await
            .map_err(|e| Error::from_git(e, &repo.branch_names()))
    }

    /// List a directory of `branch`. An empty or absent `path` falls back to
    /// the repository's `defaultPath`.
    pub async fn list_directory(
        &self,
        ident: &str,
        branch: &str,
        path: Option<&str>,
    ) -> Result<FileList> {
        let repo = self.resolve(ident, branch)?;
        let _guard = self.checkout(repo, branch).await?;

        let relative = path
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(repo.default_path.as_str());
        let root = self.store.dir(&repo.name);
        let listing = browse::list_directory(&root, relative)?;
        let prompts = browse::hint_files(&root, relative)?;
        Ok(FileList {
            path: listing.path,
            entries: listing.entries,
            prompts,
        })
    }

    pub async fn read_file(&self, ident: &str, branch: &str, path: &str) -> Result<FileContent> {
        let repo = self.resolve(ident, branch)?;
        let _guard = self.checkout(repo, branch).await?;

        let root = self.store.dir(&repo.name);
        let content = browse::read_file(&root, path)?;
        let prompts = browse::hint_files(&root, path)?;
        Ok(FileContent {
            path: path.to_string(),
            content,
            prompts,
        })
    }

    /// Regex search over the file paths of `branch`.
    ///
    /// A cached key is searched without touching the working tree. An absent
    /// key is built under the write lock, which leaves the tree on `branch`.
    pub async fn search(
        &self,
        ident: &str,
        branch: &str,
        pattern: &str,
        limit: Option<usize>,
    ) -> Result<SearchResult> {
        let repo = self.resolve(ident, branch)?;
        let matcher = SearchMatcher::new(pattern)?;
        if let Some(files) = self.cache.get(&repo.name, branch) {
            return Ok(matcher.search(&files, limit));
        }

        let _write = self.locks.write(&repo.name).await;
        self.ensure_cloned(repo).await?;
        self.cache
            .search(&repo.name, branch, &matcher, limit)
            .await
            .map_err(|e| e.with_available(&repo.branch_names()))
    }

    pub fn cache_status(&self) -> BTreeMap<String, usize> {
        self.cache.status()
    }

    /// Clear, switch, pull and rebuild every cache key in scope.
    ///
    /// Scope is every configured branch of `repo`, or of every repository
    /// when `repo` is `None`, narrowed to `branch` when given. Per-key
    /// failures are reported, not returned.
    pub async fn refresh(&self, repo: Option<&str>, branch: Option<&str>) -> Result<RefreshReport> {
        let repos: Vec<&RepositoryDescriptor> = match repo {
            Some(ident) => {
                let descriptor = match branch {
                    Some(branch) => self.resolve(ident, branch)?,
                    None => self.repository(ident)?,
                };
                vec![descriptor]
            }
            None => self.config.repos.iter().collect(),
        };

        let mut report = RefreshReport::default();
        for descriptor in repos {
            let branches: Vec<&str> = descriptor
                .branch_names()
                .into_iter()
                .filter(|name| branch.is_none_or(|wanted| wanted == *name))
                .collect();
            if branches.is_empty() {
                continue;
            }

            let _write = self.locks.write(&descriptor.name).await;
            for name in branches {
                let key = CacheKey::new(&descriptor.name, name).to_string();
                match self.refresh_key(descriptor, name).await {
                    Ok(files) => report.refreshed.push(RefreshedKey { key, files }),
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "Cache refresh failed");
                        report.failed.push(FailedKey {
                            key,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
        Ok(report)
    }

    /// Caller holds the write lock.
    async fn refresh_key(&self, repo: &RepositoryDescriptor, branch: &str) -> Result<usize> {
        let available = repo.branch_names();
        self.cache.clear(&repo.name, branch);
        self.ensure_cloned(repo).await?;
        self.store
            .switch_branch(&repo.name, branch)
            .await
            .map_err(|e| Error::from_git(e, &available))?;
        self.store.update(&repo.name).await?;
        let files = self
            .cache
            .build(&repo.name, branch)
            .await
            .map_err(|e| e.with_available(&available))?;
        Ok(files.len())
    }

    /// Clone `ident` if its working tree is missing.
    pub async fn clone_repo(&self, ident: &str) -> Result<CloneOutcome> {
        let repo = self.repository(ident)?;
        let _write = self.locks.write(&repo.name).await;
        self.ensure_cloned(repo).await
    }

    /// Fetch and fast-forward the checked-out branch of `ident`. When `HEAD`
    /// moved, the cache entry for that branch is dropped.
    pub async fn update_repo(&self, ident: &str) -> Result<UpdateReport> {
        let repo = self.repository(ident)?;
        let _write = self.locks.write(&repo.name).await;
        let report = self.store.update(&repo.name).await?;
        if report.changed
            && let Some(branch) = &report.branch
        {
            self.cache.clear(&repo.name, branch);
        }
        Ok(report)
    }

    /// Build the cache entry for `branch` of `ident`, cloning first if needed.
    pub async fn build_cache(&self, ident: &str, branch: &str) -> Result<usize> {
        let repo = self.resolve(ident, branch)?;
        let _write = self.locks.write(&repo.name).await;
        self.ensure_cloned(repo).await?;
        let files = self
            .cache
            .build(&repo.name, branch)
            .await
            .map_err(|e| e.with_available(&repo.branch_names()))?;
        Ok(files.len())
    }
}
