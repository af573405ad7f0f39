//! Glob-based file selection under the source root.
//!
//! Patterns are matched against logical paths (`/`-separated, relative to
//! the root) with literal separators, so `*` never crosses a directory and
//! `**/*.js` also matches files at the root. Directories covered by a
//! `dir/**` exclusion are not walked at all.

use crate::error::SelectError;
use glob::{MatchOptions, Pattern};
use kiln_common::LogicalPath;
use kiln_config::ResolvedProject;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Inclusion and exclusion patterns rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileSelector {
    root: PathBuf,
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
    /// Directory prefixes of `dir/**` exclusions.
    pruned: Vec<Pattern>,
}

impl FileSelector {
    /// Creates a selector with no patterns.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            includes: Vec::new(),
            excludes: Vec::new(),
            pruned: Vec::new(),
        }
    }

    /// Creates a selector with the exclusions every task shares:
    /// dependencies, build output and the cache directory.
    pub fn for_project(project: &ResolvedProject) -> Result<Self, SelectError> {
        let mut selector = Self::new(&project.source_root).exclude("node_modules/**")?;
        for dir in [&project.dist_dir, &project.cache_dir] {
            if let Some(rel) = project.logical_path(dir) {
                selector = selector.exclude(&format!("{}/**", Pattern::escape(rel.as_str())))?;
            }
        }
        Ok(selector)
    }

    /// Adds an inclusion pattern.
    pub fn include(mut self, pattern: &str) -> Result<Self, SelectError> {
        self.includes.push(compile(pattern)?);
        Ok(self)
    }

    /// Adds an exclusion pattern.
    pub fn exclude(mut self, pattern: &str) -> Result<Self, SelectError> {
        if let Some(dir) = pattern.strip_suffix("/**") {
            self.pruned.push(compile(dir)?);
        }
        self.excludes.push(compile(pattern)?);
        Ok(self)
    }

    /// Returns the selected files in selector order: grouped by the first
    /// inclusion pattern they match, sorted by logical path within a group.
    ///
    /// Matching nothing is not an error.
    pub fn select(&self) -> Result<Vec<LogicalPath>, SelectError> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            self.walk(&self.root, &mut files)?;
        }
        files.retain(|p| !self.is_excluded(p.as_str()));
        files.sort();

        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for include in &self.includes {
            for path in &files {
                if include.matches_with(path.as_str(), MATCH_OPTIONS) && seen.insert(path.clone()) {
                    ordered.push(path.clone());
                }
            }
        }
        Ok(ordered)
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excludes
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }

    fn walk(&self, dir: &Path, out: &mut Vec<LogicalPath>) -> Result<(), SelectError> {
        let entries = std::fs::read_dir(dir).map_err(|source| SelectError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| SelectError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let Ok(logical) = LogicalPath::from_base(&self.root, &path) else {
                continue;
            };
            if path.is_dir() {
                if !self
                    .pruned
                    .iter()
                    .any(|p| p.matches_with(logical.as_str(), MATCH_OPTIONS))
                {
                    self.walk(&path, out)?;
                }
            } else if path.is_file() {
                out.push(logical);
            }
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Pattern, SelectError> {
    Pattern::new(pattern).map_err(|source| SelectError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn names(paths: &[LogicalPath]) -> Vec<&str> {
        paths.iter().map(LogicalPath::as_str).collect()
    }

    #[test]
    fn recursive_pattern_matches_root_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.js");
        touch(dir.path(), "app/b.js");
        touch(dir.path(), "app/a.js");
        touch(dir.path(), "style.css");
        let files = FileSelector::new(dir.path())
            .include("**/*.js")
            .unwrap()
            .select()
            .unwrap();
        assert_eq!(names(&files), vec!["app/a.js", "app/b.js", "main.js"]);
    }

    #[test]
    fn exclusions_prune_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.js");
        touch(dir.path(), "node_modules/lib/x.js");
        touch(dir.path(), "dist/app.js");
        touch(dir.path(), "lib/jquery.min.js");
        let files = FileSelector::new(dir.path())
            .include("**/*.js")
            .unwrap()
            .exclude("node_modules/**")
            .unwrap()
            .exclude("dist/**")
            .unwrap()
            .exclude("**/*.min.js")
            .unwrap()
            .select()
            .unwrap();
        assert_eq!(names(&files), vec!["a.js"]);
    }

    #[test]
    fn first_matching_pattern_decides_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.png");
        touch(dir.path(), "b.gif");
        touch(dir.path(), "c.png");
        let files = FileSelector::new(dir.path())
            .include("**/*.gif")
            .unwrap()
            .include("**/*.png")
            .unwrap()
            .include("**/*")
            .unwrap()
            .select()
            .unwrap();
        assert_eq!(names(&files), vec!["b.gif", "a.png", "c.png"]);
    }

    #[test]
    fn empty_result_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileSelector::new(dir.path())
            .include("**/*.js")
            .unwrap()
            .select()
            .unwrap();
        assert!(files.is_empty());
        let missing = FileSelector::new(&dir.path().join("nope"))
            .include("**/*.js")
            .unwrap()
            .select()
            .unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = FileSelector::new(Path::new(".")).include("a/***").unwrap_err();
        assert!(matches!(err, SelectError::InvalidPattern { .. }));
    }
}
