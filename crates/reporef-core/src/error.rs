//! Error types for reporef-core

/// Result type for reporef-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in reporef-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No configured repository has this name or alias
    #[error("Repository \"{name}\" not found")]
    RepoNotFound { name: String },

    /// Branch is not configured, or exists in neither local nor remote refs
    #[error(
        "Branch \"{branch}\" not found in \"{repo}\", available branches: {}",
        .available.join(", ")
    )]
    BranchNotFound {
        repo: String,
        branch: String,
        available: Vec<String>,
    },

    /// Requested path does not exist in the working tree
    #[error("Path \"{path}\" not found")]
    PathNotFound { path: String },

    /// Requested path is a directory where a file was expected
    #[error("Path \"{path}\" is a directory, not a file")]
    NotAFile { path: String },

    /// Requested path is a file where a directory was expected
    #[error("Path \"{path}\" is not a directory")]
    NotADirectory { path: String },

    /// I/O failure while listing or reading
    #[error("Failed to read \"{path}\": {message}")]
    Read { path: String, message: String },

    /// Path escapes the working tree
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Search pattern is not a valid regular expression
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    /// Error from reporef-git
    #[error(transparent)]
    Git(#[from] reporef_git::Error),

    /// Error from reporef-fs
    #[error(transparent)]
    Fs(#[from] reporef_fs::Error),
}

impl Error {
    /// Attach the configured branch list to a git-level missing branch.
    pub(crate) fn from_git(err: reporef_git::Error, available: &[&str]) -> Self {
        match err {
            reporef_git::Error::BranchNotFound { repo, branch } => Self::BranchNotFound {
                repo,
                branch,
                available: available.iter().map(|b| b.to_string()).collect(),
            },
            reporef_git::Error::RepoNotFound { name } => Self::RepoNotFound { name },
            other => Self::Git(other),
        }
    }

    /// Same as [`Error::from_git`] for an error already lifted into this crate.
    pub(crate) fn with_available(self, available: &[&str]) -> Self {
        match self {
            Self::Git(err) => Self::from_git(err, available),
            other => other,
        }
    }

    /// I/O failure on `path` inside a working tree.
    pub(crate) fn read(path: impl std::fmt::Display, source: impl std::fmt::Display) -> Self {
        Self::Read {
            path: path.to_string(),
            message: source.to_string(),
        }
    }
}
