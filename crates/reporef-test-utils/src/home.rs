//! [`TestHome`]: a temporary reporef home directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary home with `config.yml` and `repos/` in the standard places.
pub struct TestHome {
    temp: TempDir,
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHome {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("TestHome::new: failed to create temp dir");
        fs::create_dir_all(temp.path().join("repos")).unwrap();
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.yml")
    }

    pub fn repo_dir(&self, name: &str) -> PathBuf {
        self.root().join("repos").join(name)
    }

    /// Write `yaml` as the home's `config.yml`.
    pub fn write_config(&self, yaml: &str) {
        fs::write(self.config_path(), yaml).unwrap();
    }

    /// Assert that `rel` exists inside the working tree of `repo`.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_repo_file_exists(&self, repo: &str, rel: &str) {
        let full = self.repo_dir(repo).join(rel);
        assert!(full.exists(), "Expected file to exist: {}", full.display());
    }

    /// Assert that `rel` does **not** exist inside the working tree of `repo`.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_repo_file_not_exists(&self, repo: &str, rel: &str) {
        let full = self.repo_dir(repo).join(rel);
        assert!(!full.exists(), "Expected file NOT to exist: {}", full.display());
    }
}
