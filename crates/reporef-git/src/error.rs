//! Error types for reporef-git

/// Result type for reporef-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in reporef-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Repository '{name}' not found")]
    RepoNotFound { name: String },

    #[error("Branch '{branch}' not found in local or remote refs of '{repo}'")]
    BranchNotFound { repo: String, branch: String },

    #[error("Failed to clone '{name}': {message}")]
    Clone { name: String, message: String },

    #[error("Cannot fast-forward '{name}': {message}")]
    UpdateConflict { name: String, message: String },

    #[error("`{command}` exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] reporef_fs::Error),
}
