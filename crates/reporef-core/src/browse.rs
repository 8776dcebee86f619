//! Directory listing, file reading and hint files inside a working tree
//!
//! All functions take the working-tree root and a client-supplied relative
//! path. They assume the tree is already on the requested branch and that the
//! caller holds the repository lock.

use std::fs;
use std::path::{Path, PathBuf};

use reporef_fs::{NormalizedPath, resolve_within};
use serde::Serialize;

use crate::{Error, Result};

/// Hint file names, checked in order; the first one present in a directory
/// wins.
pub const HINT_FILE_NAMES: [&str; 2] = [".reporef.md", ".rr.md"];

/// Immediate children of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    /// Normalized relative path, `.` for the root.
    pub path: String,
    /// Entry names, directories suffixed with `/`, sorted by name.
    pub entries: Vec<String>,
}

/// Repository-authored guidance found along a requested path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HintFile {
    pub path: String,
    pub content: String,
}

/// Resolved target plus its normalized relative form.
struct Target {
    full: PathBuf,
    relative: NormalizedPath,
}

fn resolve(root: &Path, relative: &str) -> Result<Target> {
    let full = resolve_within(root, relative).map_err(|e| match e {
        reporef_fs::Error::PathEscapesRoot { path } => Error::InvalidPath(path),
        other => Error::Fs(other),
    })?;
    let relative = NormalizedPath::new(full.strip_prefix(root).unwrap_or(Path::new("")));
    Ok(Target { full, relative })
}

fn display(relative: &NormalizedPath) -> String {
    if relative.as_str().is_empty() {
        ".".to_string()
    } else {
        relative.to_string()
    }
}

pub fn list_directory(root: &Path, relative: &str) -> Result<DirectoryListing> {
    let target = resolve(root, relative)?;
    let path = display(&target.relative);

    let metadata = match fs::metadata(&target.full) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::PathNotFound { path });
        }
        Err(e) => return Err(Error::read(&path, e)),
    };
    if !metadata.is_dir() {
        return Err(Error::NotADirectory { path });
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(&target.full).map_err(|e| Error::read(&path, e))? {
        let entry = entry.map_err(|e| Error::read(&path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == ".git" {
            continue;
        }
        // Follows symlinks so a link to a directory lists as one
        let is_dir = entry.path().is_dir();
        entries.push(if is_dir { format!("{name}/") } else { name });
    }
    entries.sort();

    Ok(DirectoryListing { path, entries })
}

/// Read a file as text. Invalid UTF-8 sequences are replaced rather than
/// rejected so binary-ish files still produce something readable.
pub fn read_file(root: &Path, relative: &str) -> Result<String> {
    let target = resolve(root, relative)?;
    let path = display(&target.relative);

    if !target.full.exists() {
        return Err(Error::PathNotFound { path });
    }
    if target.full.is_dir() {
        return Err(Error::NotAFile { path });
    }

    let bytes = fs::read(&target.full).map_err(|e| Error::read(&path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Hint files from the root down to the directory named by `relative`.
///
/// When `relative` names a file, its parent directory is the deepest one
/// searched. Unreadable hint files, and hint files resolving outside `root`,
/// are skipped with a warning.
pub fn hint_files(root: &Path, relative: &str) -> Result<Vec<HintFile>> {
    let target = resolve(root, relative)?;
    let mut parts: Vec<&str> = target
        .relative
        .as_str()
        .split('/')
        .filter(|part| !part.is_empty())
        .collect();
    if target.full.is_file() {
        parts.pop();
    }

    let mut hints = Vec::new();
    for depth in 0..=parts.len() {
        let dir = NormalizedPath::new(parts[..depth].join("/"));
        if let Some(hint) = hint_in(root, &dir) {
            hints.push(hint);
        }
    }
    Ok(hints)
}

fn hint_in(root: &Path, dir: &NormalizedPath) -> Option<HintFile> {
    for name in HINT_FILE_NAMES {
        let relative = dir.join(name);
        let full = match resolve_within(root, relative.as_str()) {
            Ok(full) => full,
            Err(e) => {
                tracing::warn!(path = %relative, error = %e, "Skipping hint file outside the working tree");
                continue;
            }
        };
        if !full.is_file() {
            continue;
        }
        match fs::read_to_string(&full) {
            Ok(content) => {
                return Some(HintFile {
                    path: relative.to_string(),
                    content,
                });
            }
            Err(e) => {
                tracing::warn!(path = %full.display(), error = %e, "Failed to read hint file");
            }
        }
    }
    None
}
