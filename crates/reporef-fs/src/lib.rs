//! Filesystem layer for reporef
//!
//! Owns the on-disk home layout (`~/.repo-ref`), path normalization and
//! confinement inside a working tree, and atomic text I/O.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use config::ConfigStore;
pub use constants::{HomePath, SKIPPED_DIRS};
pub use error::{Error, Result};
pub use layout::HomeLayout;
pub use path::{NormalizedPath, resolve_within};
