//! Ignore-list handling.
//!
//! Branch names listed in the ignore file are exempt from staleness
//! reporting and deletion, and a run started on one aborts before touching
//! the repository.

use crate::constants::IGNORE_FILE;
use anyhow::Context;
use directories::BaseDirs;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Branch names read from the effective ignore file, one per line.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    names: BTreeSet<String>,
}

impl IgnoreList {
    /// Loads the effective ignore file for a repository toplevel.
    ///
    /// The repository copy wins; the home-directory copy is consulted only
    /// when no repository copy exists. A missing file yields an empty list.
    pub fn load(toplevel: &Path) -> anyhow::Result<Self> {
        match effective_path(toplevel) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ignore file {}", path.display()))?;
        Ok(Self::from_lines(&contents))
    }

    fn from_lines(contents: &str) -> Self {
        let names = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();
        Self { names }
    }

    /// Exact-match membership; never substring or pattern matching, so a
    /// branch name that is a prefix of an ignored one is not exempt.
    #[must_use]
    pub fn contains(&self, branch: &str) -> bool {
        self.names.contains(branch)
    }

    /// Removes ignored names from `branches`, preserving order.
    #[must_use]
    pub fn filter(&self, branches: Vec<String>) -> Vec<String> {
        branches
            .into_iter()
            .filter(|branch| !self.contains(branch))
            .collect()
    }
}

/// Picks the ignore file to consult: repository toplevel, else home.
fn effective_path(toplevel: &Path) -> Option<PathBuf> {
    let repo_file = toplevel.join(IGNORE_FILE);
    if repo_file.is_file() {
        return Some(repo_file);
    }
    let home_file = BaseDirs::new()?.home_dir().join(IGNORE_FILE);
    home_file.is_file().then_some(home_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_trims_and_skips_blanks() {
        let list = IgnoreList::from_lines("feature\n\n  release \n");
        assert!(list.contains("feature"));
        assert!(list.contains("release"));
        assert!(!list.contains(""));
    }

    #[test]
    fn test_membership_is_exact_match_only() {
        let list = IgnoreList::from_lines("feature\n");
        assert!(list.contains("feature"));
        assert!(!list.contains("feature-x"));
        assert!(!list.contains("feat"));
    }

    #[test]
    fn test_filter_preserves_order() {
        let list = IgnoreList::from_lines("b\n");
        let filtered = list.filter(vec!["c".into(), "b".into(), "a".into()]);
        assert_eq!(filtered, vec!["c".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_default_list_filters_nothing() {
        let list = IgnoreList::default();
        let branches = vec!["feature".to_string()];
        assert_eq!(list.filter(branches.clone()), branches);
    }

    #[test]
    fn test_repo_file_takes_precedence() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(IGNORE_FILE), "wip\n").unwrap();
        let path = effective_path(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(IGNORE_FILE));
    }
}
