//! Git subprocess execution
//!
//! Every invocation runs with `GIT_TERMINAL_PROMPT=0` so an authentication
//! prompt fails fast instead of blocking on stdin, under the C locale so
//! callers can match on git's messages, and under a timeout so a stalled
//! network never hangs a request forever.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{Error, Result};

/// How long git commands may run before they are killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitTimeouts {
    /// clone, fetch, pull
    pub network: Duration,
    /// checkout, clean, reset
    pub local: Duration,
}

impl Default for GitTimeouts {
    fn default() -> Self {
        Self {
            network: Duration::from_secs(300),
            local: Duration::from_secs(60),
        }
    }
}

impl GitTimeouts {
    /// Use the same limit for network commands and a fifth of it (at least
    /// ten seconds) for local ones.
    pub fn from_network_secs(secs: u64) -> Self {
        Self {
            network: Duration::from_secs(secs),
            local: Duration::from_secs((secs / 5).max(10)),
        }
    }
}

/// Executes git commands in a directory.
///
/// The store only talks to git through this trait so tests can observe which
/// commands a branch switch issued.
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Run `git <args>` in `cwd`, returning stdout on success.
    async fn run(&self, cwd: &Path, args: &[&str], timeout: Duration) -> Result<String>;
}

/// Runs the system `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_path: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Create a runner using `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            git_path: "git".to_string(),
        }
    }

    /// Create a runner using an explicit git binary, such as a wrapper script
    /// or a git outside `PATH`.
    pub fn with_path(git_path: impl Into<String>) -> Self {
        Self {
            git_path: git_path.into(),
        }
    }
}

#[async_trait]
impl GitRunner for GitCli {
    async fn run(&self, cwd: &Path, args: &[&str], timeout: Duration) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!(cwd = %cwd.display(), %command, "Running git");

        let child = Command::new(&self.git_path)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| reporef_fs::Error::io(cwd, e))?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| reporef_fs::Error::io(cwd, e))?,
            Err(_) => {
                return Err(Error::Timeout {
                    command,
                    seconds: timeout.as_secs(),
                });
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::CommandFailed {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
