//! Case-insensitive regular-expression matching over cached paths

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::{Error, Result};

/// Compiled pattern limit; keeps a hostile pattern from exhausting memory.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Matches repository-relative paths against a user pattern.
///
/// The pattern is a regular expression, not a literal: `test` matches
/// `src/TEST/a.ts`, `\.rs$` matches Rust sources, and an empty pattern
/// matches everything.
#[derive(Debug, Clone)]
pub struct SearchMatcher {
    regex: Regex,
}

/// Matches in cache order, possibly truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub pattern: String,
    /// Number of matching paths before any limit was applied.
    pub total: usize,
    pub matches: Vec<String>,
}

impl SearchMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| Error::InvalidPattern(e.to_string()))?;
        Ok(Self { regex })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Filter `paths`, preserving their order. `limit` caps the returned list
    /// but not `total`.
    pub fn search(&self, paths: &[String], limit: Option<usize>) -> SearchResult {
        let mut matches = Vec::new();
        let mut total = 0;
        for path in paths.iter().filter(|p| self.is_match(p)) {
            total += 1;
            if limit.is_none_or(|max| matches.len() < max) {
                matches.push(path.clone());
            }
        }
        SearchResult {
            pattern: self.pattern().to_string(),
            total,
            matches,
        }
    }
}
