//! Repository configuration model
//!
//! ```yaml
//! globalDescription: Internal frontend libraries
//! repos:
//!   - name: ui-kit
//!     alias: [ui, kit]
//!     url: git@example.com:org/ui-kit.git
//!     description: Shared React components
//!     defaultPath: packages
//!     branches:
//!       - name: main
//!         description: Latest release
//!       - name: next
//!         description: Upcoming major
//! ```

use std::collections::HashSet;
use std::path::Path;

use reporef_fs::{ConfigStore, HomeLayout, io};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::cache::CacheKey;

/// Alternative names for a repository: a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Alias {
    One(String),
    Many(Vec<String>),
}

impl Alias {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn matches(&self, ident: &str) -> bool {
        self.names().contains(&ident)
    }
}

impl std::fmt::Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.names().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One configured repository. `name` is the unique key and the name of its
/// working-tree directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Alias>,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_path: String,
    #[serde(default)]
    pub branches: Vec<BranchDescriptor>,
}

impl RepositoryDescriptor {
    /// First configured branch, used for clone-time checkout and pre-warm.
    pub fn default_branch(&self) -> Option<&str> {
        self.branches.first().map(|b| b.name.as_str())
    }

    pub fn branch(&self, name: &str) -> Option<&BranchDescriptor> {
        self.branches.iter().find(|b| b.name == name)
    }

    pub fn branch_names(&self) -> Vec<&str> {
        self.branches.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn alias_names(&self) -> Vec<&str> {
        self.alias.as_ref().map(Alias::names).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_description: Option<String>,
    #[serde(default)]
    pub repos: Vec<RepositoryDescriptor>,
}

const CONFIG_TEMPLATE: &str = "\
# reporef configuration
#
# globalDescription: When to reach for these repositories
# repos:
#   - name: my-lib
#     alias: lib
#     url: https://github.com/org/my-lib.git
#     description: What this repository contains
#     defaultPath: src
#     branches:
#       - name: main
#         description: Stable branch
repos: []
";

impl Config {
    /// Load and validate the config at `path`.
    ///
    /// A file holding only comments and whitespace is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let content = io::read_text(path)?;
        let has_content = content
            .lines()
            .map(str::trim)
            .any(|line| !line.is_empty() && !line.starts_with('#'));
        if !has_content {
            return Ok(Self::default());
        }
        let config: Self = ConfigStore::new().parse(path, &content)?;
        Ok(config.validated())
    }

    /// Load the config, falling back to an empty one when it is missing or
    /// invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read config file");
                Self::default()
            }
        }
    }

    /// Create the home directories and a commented starter config if none
    /// exists. Returns true when the config file was created.
    pub fn ensure_file(layout: &HomeLayout) -> Result<bool> {
        layout.ensure_dirs()?;
        let path = layout.config_path();
        if path.exists() {
            return Ok(false);
        }
        io::write_text(&path, CONFIG_TEMPLATE)?;
        tracing::info!(path = %path.display(), "Created config file");
        Ok(true)
    }

    /// Find a repository by name, then by alias.
    pub fn find(&self, ident: &str) -> Option<&RepositoryDescriptor> {
        self.repos
            .iter()
            .find(|r| r.name == ident)
            .or_else(|| {
                self.repos
                    .iter()
                    .find(|r| r.alias.as_ref().is_some_and(|a| a.matches(ident)))
            })
    }

    /// Drop repositories whose name repeats an earlier one, whose name is
    /// not a usable directory name, or whose `<repo>_<branch>` cache keys
    /// collide with an earlier repository's.
    fn validated(mut self) -> Self {
        let mut seen = HashSet::new();
        let mut cache_keys = HashSet::new();
        self.repos.retain(|repo| {
            if !is_valid_repo_name(&repo.name) {
                tracing::warn!(repo = %repo.name, "Ignoring repository with invalid name");
                return false;
            }
            if seen.contains(&repo.name) {
                tracing::warn!(repo = %repo.name, "Ignoring duplicate repository");
                return false;
            }
            let keys: Vec<String> = repo
                .branch_names()
                .into_iter()
                .map(|branch| CacheKey::new(&repo.name, branch).to_string())
                .collect();
            if let Some(key) = keys.iter().find(|key| cache_keys.contains(*key)) {
                tracing::warn!(repo = %repo.name, key = %key, "Ignoring repository whose cache key collides with another");
                return false;
            }
            seen.insert(repo.name.clone());
            cache_keys.extend(keys);
            true
        });

        for repo in &self.repos {
            for alias in repo.alias_names() {
                if alias != repo.name && seen.contains(alias) {
                    tracing::warn!(
                        repo = %repo.name,
                        alias,
                        "Alias shadows another repository name; name lookup wins"
                    );
                }
            }
        }
        self
    }
}

fn is_valid_repo_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(temp: &TempDir, content: &str) -> std::path::PathBuf {
        let path = temp.path().join("config.yml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parses_both_alias_shapes_and_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            r#"
globalDescription: frontend code
repos:
  - name: a
    alias: first
    url: https://example.com/a.git
    branches:
      - name: main
  - name: b
    alias: [second, deux]
    url: https://example.com/b.git
    description: B repo
    defaultPath: src
"#,
        );

        let config = Config::load(&path).unwrap();

        assert_eq!(config.global_description.as_deref(), Some("frontend code"));
        assert_eq!(config.repos[0].alias, Some(Alias::One("first".into())));
        assert_eq!(config.repos[0].description, "");
        assert_eq!(config.repos[0].default_branch(), Some("main"));
        assert_eq!(config.repos[1].alias_names(), vec!["second", "deux"]);
        assert_eq!(config.repos[1].default_path, "src");
        assert_eq!(config.repos[1].default_branch(), None);
    }

    #[test]
    fn find_prefers_name_over_alias() {
        let config = Config {
            global_description: None,
            repos: vec![
                RepositoryDescriptor {
                    name: "x".into(),
                    alias: Some(Alias::One("y".into())),
                    url: "u1".into(),
                    description: String::new(),
                    default_path: String::new(),
                    branches: vec![],
                },
                RepositoryDescriptor {
                    name: "y".into(),
                    alias: None,
                    url: "u2".into(),
                    description: String::new(),
                    default_path: String::new(),
                    branches: vec![],
                },
            ],
        };

        assert_eq!(config.find("y").unwrap().url, "u2");
        assert_eq!(config.find("x").unwrap().url, "u1");
        assert!(config.find("z").is_none());
    }

    #[test]
    fn duplicate_and_invalid_names_are_dropped() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            r#"
repos:
  - { name: a, url: first }
  - { name: a, url: second }
  - { name: "../evil", url: third }
"#,
        );

        let config = Config::load(&path).unwrap();

        assert_eq!(config.repos.len(), 1);
        assert_eq!(config.repos[0].url, "first");
    }

    #[test]
    fn colliding_cache_keys_drop_the_later_repository() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            r#"
repos:
  - name: a_b
    url: first
    branches: [{ name: c }]
  - name: a
    url: second
    branches: [{ name: b_c }]
  - name: a_b_c
    url: third
    branches: [{ name: main }]
"#,
        );

        let config = Config::load(&path).unwrap();

        let urls: Vec<_> = config.repos.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["first", "third"]);
    }

    #[test]
    fn comment_only_file_is_empty_config() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "# repos:\n#   - name: x\n\n");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn invalid_file_falls_back_to_empty_config() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "repos: [ {name: \n");
        assert_eq!(Config::load_or_default(&path), Config::default());
        assert_eq!(
            Config::load_or_default(&temp.path().join("missing.yml")),
            Config::default()
        );
    }

    #[test]
    fn ensure_file_writes_loadable_template_once() {
        let temp = TempDir::new().unwrap();
        let layout = HomeLayout::new(temp.path().join("home"));

        assert!(Config::ensure_file(&layout).unwrap());
        assert!(!Config::ensure_file(&layout).unwrap());
        assert!(layout.repos_dir().is_dir());
        assert_eq!(Config::load(&layout.config_path()).unwrap(), Config::default());
    }
}
