// crates/core/src/filter.rs
//! Decides which paths under a watched root produce change events.
//!
//! Two rules, applied to the path relative to the root:
//! - any hidden component (`.git`, `.DS_Store`, ...) is ignored
//! - when tracked-file patterns are configured, the path must match one
//!
//! Patterns are globs (`*`, `?`, `**`, `[a-z]`, `{a,b}`). `*` and `?` never
//! cross a `/`, `**` does. A pattern without a `/` is matched against the
//! file name only; a pattern with one is matched against the whole relative
//! path.

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::PatternError;

/// Compiled filter for one watched root.
#[derive(Debug)]
pub struct PathFilter {
    root: PathBuf,
    by_name: GlobSet,
    by_path: GlobSet,
}

impl PathFilter {
    pub fn new(root: impl Into<PathBuf>, tracked_files: &[String]) -> Result<Self, PatternError> {
        let mut by_name = GlobSetBuilder::new();
        let mut by_path = GlobSetBuilder::new();
        for pattern in tracked_files {
            let pattern = pattern.trim();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| PatternError::new(pattern, source))?;
            if pattern.contains('/') {
                by_path.add(glob);
            } else {
                by_name.add(glob);
            }
        }

        Ok(Self {
            root: root.into(),
            by_name: by_name
                .build()
                .map_err(|source| PatternError::new(tracked_files.join(", "), source))?,
            by_path: by_path
                .build()
                .map_err(|source| PatternError::new(tracked_files.join(", "), source))?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn has_patterns(&self) -> bool {
        !self.by_name.is_empty() || !self.by_path.is_empty()
    }

    /// True when an event for `path` should be emitted.
    ///
    /// Paths outside the root are rejected.
    pub fn accepts(&self, path: &Path) -> bool {
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return false;
        };

        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_string_lossy();
                    if name.starts_with('.') {
                        return false;
                    }
                    parts.push(name.into_owned());
                }
                _ => return false,
            }
        }

        let Some(file_name) = parts.last() else {
            return false;
        };
        if !self.has_patterns() {
            return true;
        }

        self.by_name.is_match(file_name) || self.by_path.is_match(parts.join("/"))
    }
}
