//! Directory exclusion rules.
//!
//! Exclusion is decided once per directory. A pruned directory takes its
//! whole subtree with it: nothing below it is ever read, whatever the names
//! of the files inside.

use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::ffi::OsStr;

use crate::error::{OrganizeError, OrganizeResult};

/// Directory names that are never scanned, compared case-insensitively.
///
/// Covers operating-system folders, recycle bins, caches, version control
/// metadata and development build output.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    // Windows system directories
    "windows",
    "program files",
    "program files (x86)",
    "programdata",
    "$recycle.bin",
    "system volume information",
    "$windows.~bt",
    "$windows.~ws",
    "recovery",
    "boot",
    "msocache",
    "perflogs",
    // Application data and temporary files
    "appdata",
    "temp",
    "tmp",
    "cache",
    "caches",
    // Development folders
    "node_modules",
    "venv",
    "__pycache__",
    ".venv",
    "env",
    "build",
    "dist",
    ".next",
    ".nuxt",
    "target",
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Editor and tool state
    ".cache",
    ".config",
    ".vscode",
    ".idea",
];

/// Names starting with this character are hidden and always pruned.
pub const HIDDEN_MARKER: char = '.';

const CASE_INSENSITIVE: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Decides whether a directory subtree should be skipped.
///
/// Directories are pruned when their name is hidden, when it matches the
/// denylist (or an extra glob), or when the entry is itself a symbolic link.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    denylist: HashSet<String>,
    patterns: Vec<Pattern>,
}

impl ExclusionFilter {
    /// Creates a filter from the default denylist plus `extra` names or globs.
    ///
    /// Entries containing glob metacharacters (`*`, `?`, `[`) are compiled as
    /// patterns against the directory name; everything else is an exact name.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::InvalidPattern`] if a glob does not compile.
    pub fn new<S: AsRef<str>>(extra: &[S]) -> OrganizeResult<Self> {
        let mut denylist: HashSet<String> = DEFAULT_EXCLUDED_DIRS
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut patterns = Vec::new();

        for entry in extra {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            if entry.contains(['*', '?', '[']) {
                let pattern = Pattern::new(entry).map_err(|_| OrganizeError::InvalidPattern {
                    pattern: entry.to_string(),
                })?;
                patterns.push(pattern);
            } else {
                denylist.insert(entry.to_lowercase());
            }
        }

        Ok(Self { denylist, patterns })
    }

    /// Returns true if the directory named `name` must not be descended into.
    ///
    /// `is_symlink` is whether the entry itself is a symbolic link, which is
    /// always pruned so link chains can neither loop nor double-count.
    pub fn should_prune(&self, name: &OsStr, is_symlink: bool) -> bool {
        if is_symlink {
            return true;
        }

        let name = name.to_string_lossy();
        if name.starts_with(HIDDEN_MARKER) {
            return true;
        }

        let lowered = name.to_lowercase();
        if self.denylist.contains(&lowered) {
            return true;
        }

        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(&name, CASE_INSENSITIVE))
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self {
            denylist: DEFAULT_EXCLUDED_DIRS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            patterns: Vec::new(),
        }
    }
}
