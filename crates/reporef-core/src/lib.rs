//! Core of reporef
//!
//! Ties the configured repositories to their working trees:
//!
//! ```text
//! [ tool request (repo, branch, path | pattern) ]
//!        |
//!        v
//! [ RepoService ] -- per-repo RwLock --> [ RepoStore / BranchSwitcher ]
//!        |                                       |
//!        +--> [ PathCache ] --walk--> working tree on disk
//!        +--> [ browse ] (listing, file text, hint files)
//! ```

pub mod browse;
pub mod cache;
pub mod config;
pub mod error;
pub mod locks;
pub mod prewarm;
pub mod search;
pub mod service;

pub use browse::{DirectoryListing, HintFile};
pub use cache::{CacheKey, PathCache};
pub use config::{Alias, BranchDescriptor, Config, RepositoryDescriptor};
pub use error::{Error, Result};
pub use locks::RepoLocks;
pub use prewarm::{InitOutcome, initialize_all, spawn_prewarm};
pub use search::{SearchMatcher, SearchResult};
pub use service::{FileContent, FileList, RefreshReport, RepoService};
