//! Shared test utilities for the reporef workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: `git` CLI helpers and the [`Upstream`] fixture
//! - [`home`]: [`TestHome`], a throwaway reporef home directory

pub mod git;
pub mod home;

pub use git::Upstream;
pub use home::TestHome;
