//! Run configuration.
//!
//! A [`RunConfig`] is built once from the parsed command line, validated up
//! front, and then only read. It holds:
//!
//! - the scan roots (canonical, deduplicated, with nested roots folded into
//!   their ancestors so no subtree is scanned twice)
//! - the absolute output root
//! - the [`ExecutionMode`]
//! - the worker count
//! - the compiled [`ExclusionFilter`] (defaults plus `--exclude` entries)

use std::path::{Path, PathBuf};
use std::thread;
use tracing::warn;

use crate::error::{OrganizeError, OrganizeResult};
use crate::exclusion::ExclusionFilter;
use crate::file_linker::ExecutionMode;

/// Validated, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    scan_roots: Vec<PathBuf>,
    output_root: PathBuf,
    mode: ExecutionMode,
    workers: usize,
    exclusions: ExclusionFilter,
}

impl RunConfig {
    /// Validates roots and output and builds a config with default workers
    /// and exclusions.
    ///
    /// # Errors
    ///
    /// * [`OrganizeError::NoScanRoots`] if no root is an existing directory.
    /// * [`OrganizeError::OutputNotADirectory`] if the output path exists and
    ///   is not a directory.
    /// * [`OrganizeError::OutputRoot`] if the output path cannot be resolved.
    pub fn new(
        scan_roots: impl IntoIterator<Item = PathBuf>,
        output_root: impl AsRef<Path>,
        mode: ExecutionMode,
    ) -> OrganizeResult<Self> {
        let scan_roots = resolve_roots(scan_roots);
        if scan_roots.is_empty() {
            return Err(OrganizeError::NoScanRoots);
        }

        let output_root = resolve_output(output_root.as_ref())?;
        let workers = default_workers(scan_roots.len());

        Ok(Self {
            scan_roots,
            output_root,
            mode,
            workers,
            exclusions: ExclusionFilter::default(),
        })
    }

    /// Sets the worker pool size (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Adds directory names or glob patterns to prune on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::InvalidPattern`] if a glob does not compile.
    pub fn with_excludes<S: AsRef<str>>(mut self, extra: &[S]) -> OrganizeResult<Self> {
        self.exclusions = ExclusionFilter::new(extra)?;
        Ok(self)
    }

    pub fn scan_roots(&self) -> &[PathBuf] {
        &self.scan_roots
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn exclusions(&self) -> &ExclusionFilter {
        &self.exclusions
    }
}

fn resolve_roots(roots: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut resolved: Vec<PathBuf> = roots
        .into_iter()
        .filter_map(|root| match root.canonicalize() {
            Ok(canonical) if canonical.is_dir() => Some(canonical),
            Ok(_) => {
                warn!(root = %root.display(), "scan root is not a directory, skipping");
                None
            }
            Err(err) => {
                warn!(root = %root.display(), error = %err, "scan root is not accessible, skipping");
                None
            }
        })
        .collect();

    resolved.sort();
    resolved.dedup();

    // Sorted order puts every ancestor before its descendants.
    let mut kept: Vec<PathBuf> = Vec::with_capacity(resolved.len());
    for root in resolved {
        if kept.iter().any(|ancestor| root.starts_with(ancestor)) {
            warn!(root = %root.display(), "scan root lies inside another root, skipping");
            continue;
        }
        kept.push(root);
    }
    kept
}

fn resolve_output(output: &Path) -> OrganizeResult<PathBuf> {
    let absolute = if output.is_absolute() {
        output.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| OrganizeError::OutputRoot {
                path: output.to_path_buf(),
                source,
            })?
            .join(output)
    };

    if !absolute.exists() {
        return Ok(absolute);
    }
    if !absolute.is_dir() {
        return Err(OrganizeError::OutputNotADirectory { path: absolute });
    }
    absolute
        .canonicalize()
        .map_err(|source| OrganizeError::OutputRoot {
            path: absolute.clone(),
            source,
        })
}

fn default_workers(roots: usize) -> usize {
    let available = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    roots.clamp(1, available.max(1))
}
