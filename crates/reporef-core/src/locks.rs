//! Per-repository read/write locks
//!
//! Readers (listing, reading, searching a branch that is already checked out)
//! share the lock. Anything that moves `HEAD` or rewrites the tree (clone,
//! switch, update, cache build) takes it exclusively, and may downgrade to a
//! read guard afterwards without letting another writer in.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

#[derive(Debug, Default)]
pub struct RepoLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for `repo`, created on first use.
    pub fn lock_for(&self, repo: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(repo.to_string()).or_default())
    }

    pub async fn read(&self, repo: &str) -> OwnedRwLockReadGuard<()> {
        self.lock_for(repo).read_owned().await
    }

    pub async fn write(&self, repo: &str) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(repo).write_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn same_repository_shares_one_lock() {
        let locks = RepoLocks::new();
        assert!(Arc::ptr_eq(&locks.lock_for("a"), &locks.lock_for("a")));
        assert!(!Arc::ptr_eq(&locks.lock_for("a"), &locks.lock_for("b")));
    }

    #[tokio::test]
    async fn writer_excludes_readers_until_downgraded() {
        let locks = RepoLocks::new();
        let write = locks.write("a").await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.read("a")).await;
        assert!(blocked.is_err());

        let _read = write.downgrade();
        let shared = tokio::time::timeout(Duration::from_millis(50), locks.read("a")).await;
        assert!(shared.is_ok());
    }

    #[tokio::test]
    async fn repositories_do_not_block_each_other() {
        let locks = RepoLocks::new();
        let _a = locks.write("a").await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.write("b")).await;
        assert!(b.is_ok());
    }
}
