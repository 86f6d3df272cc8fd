//! Run results.
//!
//! [`ScanResult`] is built by folding task outcomes in any order: every
//! counter is a sum and [`ScanResult::merge`] is commutative. The
//! presentation order of failures and warnings is fixed once by
//! [`ScanResult::finish`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::file_category::Category;
use crate::file_linker::{ExecutionMode, TaskOutcome};
use crate::planner::LinkTask;
use crate::walker::ScanWarning;

/// Per-category counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub planned: u64,
    pub created: u64,
    pub skipped_identical: u64,
    pub failed: u64,
}

impl CategoryTally {
    fn merge(&mut self, other: &CategoryTally) {
        self.planned += other.planned;
        self.created += other.created;
        self.skipped_identical += other.skipped_identical;
        self.failed += other.failed;
    }
}

/// A task that ended in failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub source: PathBuf,
    pub target: PathBuf,
    pub reason: String,
}

/// Everything a caller needs to report on a run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Roots that were walked (fully or until cancelled).
    pub roots_scanned: usize,
    /// Regular files seen by the walkers.
    pub files_seen: u64,
    /// Files dropped because their extension maps to no category.
    pub unsupported: u64,
    /// Files the OS marks as system files, never considered for linking.
    pub system_files: u64,
    pub categories: BTreeMap<Category, CategoryTally>,
    pub failures: Vec<FailureRecord>,
    pub warnings: Vec<ScanWarning>,
    /// The run was interrupted; counts cover only the work that finished.
    pub cancelled: bool,
}

impl ScanResult {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            finished_at: None,
            roots_scanned: 0,
            files_seen: 0,
            unsupported: 0,
            system_files: 0,
            categories: BTreeMap::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            cancelled: false,
        }
    }

    /// Counts `task` as planned. Called once per task in the plan.
    pub fn record_planned(&mut self, task: &LinkTask) {
        self.tally_mut(task.category).planned += 1;
    }

    /// Folds one task's terminal state into the counters.
    pub fn record(&mut self, task: &LinkTask, outcome: &TaskOutcome) {
        let tally = self.tally_mut(task.category);
        match outcome {
            TaskOutcome::WouldCreate => {}
            TaskOutcome::Created => tally.created += 1,
            TaskOutcome::SkippedIdentical => tally.skipped_identical += 1,
            TaskOutcome::Failed(reason) => {
                tally.failed += 1;
                self.failures.push(FailureRecord {
                    source: task.source.clone(),
                    target: task.target.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    /// Adds another partial result into this one.
    pub fn merge(mut self, other: ScanResult) -> ScanResult {
        self.roots_scanned += other.roots_scanned;
        self.files_seen += other.files_seen;
        self.unsupported += other.unsupported;
        self.system_files += other.system_files;
        for (category, tally) in &other.categories {
            self.tally_mut(*category).merge(tally);
        }
        self.failures.extend(other.failures);
        self.warnings.extend(other.warnings);
        self.cancelled |= other.cancelled;
        self.started_at = self.started_at.min(other.started_at);
        self
    }

    /// Stamps the end time and sorts failures and warnings by path.
    pub fn finish(mut self) -> ScanResult {
        self.failures
            .sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.target.cmp(&b.target)));
        self.warnings.sort_by(|a, b| a.path.cmp(&b.path));
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn tally(&self, category: Category) -> CategoryTally {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    /// Sum over all categories.
    pub fn total(&self) -> CategoryTally {
        let mut total = CategoryTally::default();
        for tally in self.categories.values() {
            total.merge(tally);
        }
        total
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn tally_mut(&mut self, category: Category) -> &mut CategoryTally {
        self.categories.entry(category).or_default()
    }
}
