//! Git layer for reporef
//!
//! Mirrors remote repositories into one working tree each and switches that
//! tree between branches. Network and mutating operations shell out to the
//! `git` CLI (with timeouts); read-only ref inspection goes through libgit2.

pub mod error;
pub mod refs;
pub mod runner;
pub mod store;
pub mod switcher;

pub use error::{Error, Result};
pub use runner::{GitCli, GitRunner, GitTimeouts};
pub use store::{CloneOutcome, RepoStore, UpdateReport};
pub use switcher::{BranchSwitcher, SwitchOutcome, SwitchPlan};
