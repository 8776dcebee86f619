//! Home directory layout
//!
//! ```text
//! ~/.repo-ref/
//! ├── config.yml     # repository descriptors
//! └── repos/
//!     ├── <name>/    # one working tree per repository
//!     └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, HomePath, Result};

/// Default directory name under the user's home.
pub const DEFAULT_HOME_DIR: &str = ".repo-ref";

/// Environment variable overriding the home directory.
pub const HOME_ENV_VAR: &str = "REPOREF_HOME";

/// Resolved locations of the reporef home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    root: PathBuf,
}

impl HomeLayout {
    /// Use `root` as the home directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the home directory: explicit override, then `~/.repo-ref`.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = explicit {
            return Ok(Self::new(root));
        }
        let home = dirs::home_dir().ok_or(Error::HomeDirUnavailable)?;
        Ok(Self::new(home.join(DEFAULT_HOME_DIR)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(HomePath::ConfigFile)
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join(HomePath::ReposDir)
    }

    /// Working-tree directory for a repository.
    pub fn repo_dir(&self, name: &str) -> PathBuf {
        self.repos_dir().join(name)
    }

    /// Create the home and `repos` directories if they are missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        let repos = self.repos_dir();
        fs::create_dir_all(&repos).map_err(|e| Error::io(&repos, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_paths() {
        let layout = HomeLayout::new("/data/rr");
        assert_eq!(layout.config_path(), PathBuf::from("/data/rr/config.yml"));
        assert_eq!(layout.repo_dir("demo"), PathBuf::from("/data/rr/repos/demo"));
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let layout = HomeLayout::new(temp.path().join("home"));
        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();
        assert!(layout.repos_dir().is_dir());
    }

    #[test]
    fn explicit_root_wins() {
        let layout = HomeLayout::resolve(Some(PathBuf::from("/custom"))).unwrap();
        assert_eq!(layout.root(), Path::new("/custom"));
    }
}
