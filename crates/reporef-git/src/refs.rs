//! Read-only ref inspection through libgit2
//!
//! These never touch the working tree, so they are safe to call while
//! holding only a read lock on the repository.

use std::path::Path;

use git2::{BranchType, ErrorCode, Oid, Repository};

use crate::Result;

/// Name of the remote every working tree is cloned from.
pub const ORIGIN: &str = "origin";

/// Open the repository rooted at `dir`.
pub fn open(dir: &Path) -> Result<Repository> {
    Ok(Repository::open(dir)?)
}

/// Get the current branch name from a repository.
///
/// Returns the branch name if HEAD points to a branch (born or unborn), or
/// `None` if HEAD is detached.
pub fn current_branch(repo: &Repository) -> Result<Option<String>> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().map(String::from)),
        Ok(_) => Ok(None),
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            let head = repo.find_reference("HEAD")?;
            Ok(head
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(String::from))
        }
        Err(e) => Err(e.into()),
    }
}

/// Commit HEAD points at, `None` on an unborn branch.
pub fn head_oid(repo: &Repository) -> Result<Option<Oid>> {
    match repo.head() {
        Ok(head) => Ok(head.target()),
        Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// `refs/heads/<name>` exists.
pub fn local_branch_exists(repo: &Repository, name: &str) -> bool {
    repo.find_branch(name, BranchType::Local).is_ok()
}

/// `refs/remotes/origin/<name>` exists.
pub fn remote_branch_exists(repo: &Repository, name: &str) -> bool {
    repo.find_branch(&format!("{ORIGIN}/{name}"), BranchType::Remote)
        .is_ok()
}

/// Upstream of a local branch, e.g. `origin/dev`, if one is configured.
pub fn upstream_of(repo: &Repository, name: &str) -> Result<Option<String>> {
    let branch = repo.find_branch(name, BranchType::Local)?;
    match branch.upstream() {
        Ok(upstream) => Ok(upstream.name()?.map(String::from)),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Names of all local branches.
pub fn local_branches(repo: &Repository) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = entry?;
        if let Some(name) = branch.name()? {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo_with_commit(temp: &TempDir) -> Repository {
        let repo = Repository::init(temp.path()).unwrap();
        {
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial", &tree, &[])
                .unwrap();
        }
        repo
    }

    #[test]
    fn current_branch_on_fresh_commit() {
        let temp = TempDir::new().unwrap();
        let repo = repo_with_commit(&temp);

        let branch = current_branch(&repo).unwrap();
        // Default branch is either "main" or "master" depending on git config
        assert!(branch == Some("main".to_string()) || branch == Some("master".to_string()));
        assert!(head_oid(&repo).unwrap().is_some());
    }

    #[test]
    fn current_branch_on_unborn_head() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        assert!(current_branch(&repo).unwrap().is_some());
        assert_eq!(head_oid(&repo).unwrap(), None);
    }

    #[test]
    fn detached_head_has_no_branch() {
        let temp = TempDir::new().unwrap();
        let repo = repo_with_commit(&temp);
        let oid = repo.head().unwrap().target().unwrap();
        repo.set_head_detached(oid).unwrap();

        assert_eq!(current_branch(&repo).unwrap(), None);
    }

    #[test]
    fn branch_existence_checks() {
        let temp = TempDir::new().unwrap();
        let repo = repo_with_commit(&temp);
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("feature", &head, false).unwrap();

        assert!(local_branch_exists(&repo, "feature"));
        assert!(!local_branch_exists(&repo, "missing"));
        assert!(!remote_branch_exists(&repo, "feature"));
        assert_eq!(upstream_of(&repo, "feature").unwrap(), None);
        assert!(local_branches(&repo).unwrap().contains(&"feature".to_string()));
    }
}
