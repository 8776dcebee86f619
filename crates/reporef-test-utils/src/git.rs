//! Git fixtures driven through the `git` CLI.
//!
//! The [`Upstream`] fixture plays the role of a remote: tests clone it by
//! path, then commit to it to simulate upstream activity.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run `git <args>` in `cwd` and return trimmed stdout.
///
/// # Panics
/// Panics if git cannot be spawned or exits non-zero.
pub fn run_git(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap_or_else(|e| panic!("run_git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "run_git: `git {args:?}` failed in {}:\n{}",
            cwd.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// True when `git <args>` exits zero.
pub fn git_succeeds(cwd: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Configure a commit identity local to the repository at `path`.
pub fn configure_identity(path: &Path) {
    run_git(path, &["config", "user.email", "test@test.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
    run_git(path, &["config", "commit.gpgsign", "false"]);
}

/// Write `files` (creating parent dirs) under `root`.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("write_files: failed to create {parent:?}: {e}"));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_files: failed to write {path:?}: {e}"));
    }
}

/// A non-bare repository standing in for a remote, with `main` as its
/// default branch.
///
/// # Example
///
/// ```rust,no_run
/// use reporef_test_utils::Upstream;
///
/// let upstream = Upstream::new();
/// upstream.commit("main", &[("README.md", "# demo")]);
/// upstream.commit("dev", &[("dev.txt", "dev only")]);
/// ```
pub struct Upstream {
    temp: TempDir,
}

impl Default for Upstream {
    fn default() -> Self {
        Self::new()
    }
}

impl Upstream {
    /// Initialise an empty repository whose unborn HEAD is `main`.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Upstream::new: failed to create temp dir");
        run_git(temp.path(), &["init", "-q"]);
        run_git(temp.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        configure_identity(temp.path());
        Self { temp }
    }

    /// `main` with `main_files`, plus one branch per entry of `branches`
    /// forked from `main`, each adding its own files.
    pub fn with_branches(main_files: &[(&str, &str)], branches: &[(&str, &[(&str, &str)])]) -> Self {
        let upstream = Self::new();
        upstream.commit("main", main_files);
        for (name, files) in branches {
            upstream.commit(name, files);
        }
        upstream
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Clone URL (a plain filesystem path).
    pub fn url(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }

    /// Commit `files` on `branch`, creating the branch from the current HEAD
    /// when missing. Leaves `main` checked out afterwards. Returns the new
    /// commit id.
    pub fn commit(&self, branch: &str, files: &[(&str, &str)]) -> String {
        self.checkout(branch);
        write_files(self.path(), files);
        run_git(self.path(), &["add", "-A"]);
        run_git(
            self.path(),
            &["commit", "-q", "--allow-empty", "-m", &format!("update {branch}")],
        );
        let oid = self.head_of(branch);
        if branch != "main" {
            self.checkout("main");
        }
        oid
    }

    /// Delete `path` on `branch` and commit.
    pub fn remove(&self, branch: &str, path: &str) -> String {
        self.checkout(branch);
        run_git(self.path(), &["rm", "-q", path]);
        run_git(self.path(), &["commit", "-q", "-m", &format!("remove {path}")]);
        let oid = self.head_of(branch);
        if branch != "main" {
            self.checkout("main");
        }
        oid
    }

    /// Commit id of `branch`.
    pub fn head_of(&self, branch: &str) -> String {
        run_git(self.path(), &["rev-parse", &format!("refs/heads/{branch}")])
    }

    fn checkout(&self, branch: &str) {
        let current = run_git(self.path(), &["symbolic-ref", "--short", "HEAD"]);
        if current == branch {
            return;
        }
        let exists = git_succeeds(
            self.path(),
            &["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")],
        );
        if exists {
            run_git(self.path(), &["checkout", "-q", branch]);
        } else {
            run_git(self.path(), &["checkout", "-q", "-b", branch]);
        }
    }
}

/// Open a working tree with `git2` for assertions.
pub fn open(path: &Path) -> git2::Repository {
    git2::Repository::open(path)
        .unwrap_or_else(|e| panic!("open: failed to open repository at {}: {e}", path.display()))
}
