//! Depth-first traversal of a scan root.
//!
//! [`DirectoryWalker::walk`] returns a lazy [`Walk`] iterator of regular
//! files. An excluded directory is listed once by the underlying walker
//! (names are sorted before they are visited) but none of its entries are
//! visited or descended into. Unreadable directories are recorded as
//! [`ScanWarning`]s and skipped, and a per-walk visited set of canonical
//! directory paths keeps bind mounts and junctions from looping. On Windows,
//! files marked with the system attribute are counted and left out.

use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::exclusion::ExclusionFilter;
use crate::organizer::CancelToken;

/// Kind of traversal warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A directory could not be opened for lack of permission.
    PermissionDenied,
    /// Any other error reading a directory or an entry.
    ReadError,
    /// A directory was reached a second time through another path.
    Cycle,
}

/// Non-fatal problem met while walking. The affected subtree was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct ScanWarning {
    /// Path where the problem occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    fn from_walkdir(err: &walkdir::Error, root: &Path) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        let kind = match err.io_error().map(io::Error::kind) {
            Some(io::ErrorKind::PermissionDenied) => WarningKind::PermissionDenied,
            _ => WarningKind::ReadError,
        };
        let message = match err.io_error() {
            Some(source) => source.to_string(),
            None => err.to_string(),
        };
        Self::new(path, message, kind)
    }
}

/// Walks scan roots one directory at a time, applying an [`ExclusionFilter`]
/// at every directory boundary.
pub struct DirectoryWalker<'a> {
    filter: &'a ExclusionFilter,
    skip_dirs: Vec<PathBuf>,
    cancel: Option<&'a CancelToken>,
}

impl<'a> DirectoryWalker<'a> {
    /// Create a walker that prunes with `filter`.
    pub fn new(filter: &'a ExclusionFilter) -> Self {
        Self {
            filter,
            skip_dirs: Vec::new(),
            cancel: None,
        }
    }

    /// Never descend into `dir` (compared by canonical path).
    ///
    /// Used to keep the generated category folders out of the scan when the
    /// output root lies inside, or is, a scan root. A root itself is always
    /// walked, even if it is listed here.
    pub fn skip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.skip_dirs.push(dir.canonicalize().unwrap_or(dir));
        self
    }

    /// Stop yielding files once `cancel` trips.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Start a fresh traversal of `root`.
    ///
    /// Children are visited in file-name order so repeated walks over an
    /// unchanged tree yield the same sequence. The root itself is never
    /// pruned, even when its own name would be excluded.
    pub fn walk(&self, root: &Path) -> Walk<'_> {
        let inner = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Walk {
            walker: self,
            root: root.to_path_buf(),
            inner,
            visited: HashSet::new(),
            warnings: Vec::new(),
            system_files: 0,
        }
    }
}

/// Lazy sequence of regular files under one root.
///
/// Call [`Walk::into_warnings`] after exhausting it to collect the subtrees
/// that were skipped.
pub struct Walk<'a> {
    walker: &'a DirectoryWalker<'a>,
    root: PathBuf,
    inner: walkdir::IntoIter,
    visited: HashSet<PathBuf>,
    warnings: Vec<ScanWarning>,
    system_files: u64,
}

impl Walk<'_> {
    /// Files skipped so far because the OS marks them as system files.
    pub fn system_files(&self) -> u64 {
        self.system_files
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Consume the walk, returning every warning it recorded.
    pub fn into_warnings(self) -> Vec<ScanWarning> {
        self.warnings
    }

    /// Decide whether to descend into the directory `entry`. Returns false
    /// for subtrees that must be skipped.
    fn enter_dir(&mut self, entry: &walkdir::DirEntry) -> bool {
        if entry.depth() > 0
            && self
                .walker
                .filter
                .should_prune(entry.file_name(), entry.path_is_symlink())
        {
            debug!(path = %entry.path().display(), "pruned excluded directory");
            return false;
        }

        let identity = match entry.path().canonicalize() {
            Ok(canonical) => canonical,
            Err(err) => {
                debug!(path = %entry.path().display(), error = %err, "could not resolve directory");
                entry.path().to_path_buf()
            }
        };

        if entry.depth() > 0 && self.walker.skip_dirs.iter().any(|dir| *dir == identity) {
            debug!(path = %entry.path().display(), "skipping output directory");
            return false;
        }

        if !self.visited.insert(identity) {
            debug!(path = %entry.path().display(), "directory already visited");
            self.warnings.push(ScanWarning::new(
                entry.path(),
                "directory already visited through another path",
                WarningKind::Cycle,
            ));
            return false;
        }

        true
    }
}

impl Iterator for Walk<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if self.walker.cancel.is_some_and(CancelToken::is_cancelled) {
                return None;
            }

            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let warning = ScanWarning::from_walkdir(&err, &self.root);
                    warn!(path = %warning.path.display(), "skipping unreadable entry: {}", warning.message);
                    self.warnings.push(warning);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                if !self.enter_dir(&entry) {
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if file_type.is_symlink() {
                // Never followed, whether it points at a file or a directory.
                debug!(path = %entry.path().display(), "skipping symbolic link");
                continue;
            }

            if file_type.is_file() {
                if is_system_file(&entry) {
                    debug!(path = %entry.path().display(), "skipping system file");
                    self.system_files += 1;
                    continue;
                }
                return Some(entry.into_path());
            }
        }
    }
}

/// Windows `FILE_ATTRIBUTE_SYSTEM`.
#[cfg(windows)]
const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;

#[cfg(windows)]
fn is_system_file(entry: &walkdir::DirEntry) -> bool {
    use std::os::windows::fs::MetadataExt;

    entry
        .metadata()
        .is_ok_and(|meta| meta.file_attributes() & FILE_ATTRIBUTE_SYSTEM != 0)
}

#[cfg(not(windows))]
fn is_system_file(_entry: &walkdir::DirEntry) -> bool {
    false
}
