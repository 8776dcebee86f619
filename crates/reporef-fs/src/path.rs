//! Normalized path handling and confinement to a working tree

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Paths reported to clients (cache entries, listings, hint files) are
/// always rendered with `/` regardless of platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let normalized = path_str.replace('\\', "/");
        Self { inner: normalized }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let joined = if self.inner.is_empty() {
            segment_normalized
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Resolve a client-supplied relative path inside `root`.
///
/// Empty input, `.` segments and `..` segments that stay inside the tree are
/// accepted. Absolute paths, drive prefixes, and `..` segments that climb
/// above `root` are rejected. When the target exists it is also canonicalized
/// so a symlink pointing outside the tree is rejected as well.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf> {
    let escape = || Error::PathEscapesRoot {
        path: relative.to_string(),
    };

    let cleaned = relative.replace('\\', "/");
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(&cleaned).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(escape());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(&parts);

    if resolved.exists() {
        let canonical_root = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        let canonical = dunce::canonicalize(&resolved).map_err(|e| Error::io(&resolved, e))?;
        if !canonical.starts_with(&canonical_root) {
            return Err(escape());
        }
    }

    Ok(resolved)
}
