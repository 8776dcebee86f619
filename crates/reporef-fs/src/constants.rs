//! Well-known names inside the reporef home directory and working trees.

use std::path::Path;

/// Directory names never descended into when indexing a working tree.
pub const SKIPPED_DIRS: [&str; 2] = [".git", "node_modules"];

/// Entries of the reporef home directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomePath {
    /// The `config.yml` file holding repository descriptors
    ConfigFile,
    /// The `repos` directory holding one working tree per repository
    ReposDir,
}

impl HomePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigFile => "config.yml",
            Self::ReposDir => "repos",
        }
    }
}

impl AsRef<Path> for HomePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for HomePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for HomePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
