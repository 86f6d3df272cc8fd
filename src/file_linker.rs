//! Link creation for planned tasks.
//!
//! This module turns a [`LinkTask`] into a symbolic link under the output
//! root. Every task ends in one [`TaskOutcome`]; failures are values, never
//! errors that stop the run. Nothing outside the output root is written and
//! source files are only ever read.
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::LinkError;
use crate::planner::LinkTask;

/// Whether a run mutates the filesystem. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Plan and report only.
    DryRun,
    /// Create directories and links.
    Apply,
}

impl ExecutionMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Apply }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// Terminal state of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Dry run: the link would have been created.
    WouldCreate,
    /// The link was created.
    Created,
    /// The target already is a link to this task's source.
    SkippedIdentical,
    /// The task could not be carried out.
    Failed(String),
}

/// Carries out link tasks in one [`ExecutionMode`].
#[derive(Debug, Clone, Copy)]
pub struct LinkExecutor {
    mode: ExecutionMode,
}

impl LinkExecutor {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Executes `task` and reports its outcome.
    ///
    /// In [`ExecutionMode::DryRun`] this performs no filesystem calls at all.
    /// In [`ExecutionMode::Apply`]:
    ///
    /// * an existing link to the same source is left alone (`SkippedIdentical`),
    ///   which makes re-running idempotent;
    /// * anything else already at the target is left alone and the task fails;
    /// * otherwise missing parent directories are created and the link made.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use symsort::file_category::Category;
    /// use symsort::file_linker::{ExecutionMode, LinkExecutor, TaskOutcome};
    /// use symsort::planner::LinkTask;
    /// use std::path::PathBuf;
    ///
    /// let task = LinkTask {
    ///     source: PathBuf::from("/data/Music/song.mp3"),
    ///     target: PathBuf::from("/out/audio/Music/song.mp3"),
    ///     category: Category::Audio,
    ///     label: "Music".into(),
    ///     suffix: None,
    /// };
    /// let outcome = LinkExecutor::new(ExecutionMode::Apply).execute(&task);
    /// assert!(!matches!(outcome, TaskOutcome::WouldCreate));
    /// ```
    pub fn execute(&self, task: &LinkTask) -> TaskOutcome {
        if self.mode.is_dry_run() {
            debug!(source = %task.source.display(), target = %task.target.display(), "would link");
            return TaskOutcome::WouldCreate;
        }

        match Self::link_with_record(task) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(source = %task.source.display(), target = %task.target.display(), "link failed: {}", err);
                TaskOutcome::Failed(err.to_string())
            }
        }
    }

    fn link_with_record(task: &LinkTask) -> Result<TaskOutcome, LinkError> {
        match fs::symlink_metadata(&task.target) {
            Ok(existing) => {
                if existing.file_type().is_symlink() && points_to(&task.target, &task.source) {
                    debug!(target = %task.target.display(), "link already in place");
                    return Ok(TaskOutcome::SkippedIdentical);
                }
                return Err(LinkError::TargetExists);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(LinkError::from_io(err)),
        }

        if let Some(parent) = task.target.parent() {
            fs::create_dir_all(parent).map_err(LinkError::from_io)?;
        }

        create_symlink(&task.source, &task.target).map_err(LinkError::from_io)?;
        debug!(source = %task.source.display(), target = %task.target.display(), "created link");
        Ok(TaskOutcome::Created)
    }
}

/// True if the link at `link` resolves to the same file as `source`.
fn points_to(link: &Path, source: &Path) -> bool {
    match (fs::canonicalize(link), fs::canonicalize(source)) {
        (Ok(resolved), Ok(expected)) => resolved == expected,
        _ => false,
    }
}

#[cfg(unix)]
fn create_symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn create_symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, target)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_source: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
