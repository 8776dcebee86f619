//! Per-branch file path cache
//!
//! Entries are keyed by `(repo, branch)` and hold every file path of that
//! branch, relative to the working-tree root with `/` separators. Reads never
//! refresh an entry; staleness is resolved by [`PathCache::clear`] followed by
//! a rebuild, or by lazily building a key that is absent.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use reporef_fs::SKIPPED_DIRS;
use reporef_git::RepoStore;

use crate::search::{SearchMatcher, SearchResult};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub repo: String,
    pub branch: String,
}

impl CacheKey {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.repo, self.branch)
    }
}

type Entries = HashMap<CacheKey, Arc<Vec<String>>>;

pub struct PathCache {
    store: RepoStore,
    entries: RwLock<Entries>,
}

impl fmt::Debug for PathCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathCache")
            .field("keys", &self.status())
            .finish_non_exhaustive()
    }
}

impl PathCache {
    pub fn new(store: RepoStore) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Switch `repo` to `branch`, walk its working tree and replace the entry.
    ///
    /// The caller must hold the repository's write lock. On failure the
    /// previous entry for the key is left as it was.
    pub async fn build(&self, repo: &str, branch: &str) -> Result<Arc<Vec<String>>> {
        self.store.switch_branch(repo, branch).await?;

        let root = self.store.dir(repo);
        let files = tokio::task::spawn_blocking(move || collect_files(&root))
            .await
            .map_err(|e| Error::read(repo, e))??;

        let files = Arc::new(files);
        tracing::info!(repo = %repo, branch = %branch, files = files.len(), "Built path cache");
        self.write()
            .insert(CacheKey::new(repo, branch), Arc::clone(&files));
        Ok(files)
    }

    pub fn get(&self, repo: &str, branch: &str) -> Option<Arc<Vec<String>>> {
        self.read().get(&CacheKey::new(repo, branch)).cloned()
    }

    pub fn contains(&self, repo: &str, branch: &str) -> bool {
        self.read().contains_key(&CacheKey::new(repo, branch))
    }

    /// Search the cached paths, building the entry first when it is absent.
    ///
    /// Takes a compiled matcher so a bad pattern fails before any git work.
    pub async fn search(
        &self,
        repo: &str,
        branch: &str,
        matcher: &SearchMatcher,
        limit: Option<usize>,
    ) -> Result<SearchResult> {
        let files = match self.get(repo, branch) {
            Some(files) => files,
            None => self.build(repo, branch).await?,
        };
        Ok(matcher.search(&files, limit))
    }

    /// Drop the entry for the key. Clearing an absent key is a no-op.
    pub fn clear(&self, repo: &str, branch: &str) {
        if self.write().remove(&CacheKey::new(repo, branch)).is_some() {
            tracing::debug!(repo = %repo, branch = %branch, "Cleared path cache");
        }
    }

    /// Populated keys rendered as `<repo>_<branch>` with their file counts.
    pub fn status(&self) -> BTreeMap<String, usize> {
        self.read()
            .iter()
            .map(|(key, files)| (key.to_string(), files.len()))
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Every non-directory entry below `root`, depth-first with siblings in name
/// order. Directories named in [`SKIPPED_DIRS`] are pruned at any depth;
/// files with those names are kept.
pub fn collect_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    walk(root, "", &mut files)?;
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, files: &mut Vec<String>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .and_then(|iter| iter.collect::<std::io::Result<Vec<_>>>())
        .map_err(|e| Error::read(dir.display(), e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let file_type = entry
            .file_type()
            .map_err(|e| Error::read(&relative, e))?;
        if file_type.is_dir() {
            if SKIPPED_DIRS.contains(&name.as_str()) {
                continue;
            }
            walk(&entry.path(), &relative, files)?;
        } else {
            files.push(relative);
        }
    }
    Ok(())
}
