//! Run orchestration: scan roots in parallel, plan once, execute in parallel.
//!
//! Each scan root is one unit of work on a bounded rayon pool and is walked
//! sequentially by a single worker. Collision resolution happens in one
//! global stage after every root is done, so suffix order never depends on
//! thread timing. Execution folds outcomes into per-worker [`ScanResult`]s
//! that are merged at the end.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::aggregate::ScanResult;
use crate::config::RunConfig;
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::{Category, CategoryTable};
use crate::file_linker::{ExecutionMode, LinkExecutor, TaskOutcome};
use crate::planner::{LabelSet, LinkPlanner, LinkTask, SourceFile};
use crate::walker::DirectoryWalker;

/// Shared flag used to interrupt a run.
///
/// Once tripped, no new root is started, walkers stop yielding files and no
/// further task is executed. Work already in flight finishes normally.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives progress notifications from worker threads.
pub trait ProgressSink: Send + Sync {
    /// A categorized file was found during scanning.
    fn file_found(&self, _file: &SourceFile) {}

    /// A task reached its terminal state.
    fn task_done(&self, _task: &LinkTask, _outcome: &TaskOutcome) {}
}

/// Progress sink that ignores everything.
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// The full plan, computed before any filesystem mutation.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Tasks in source-path order.
    pub tasks: Vec<LinkTask>,
    /// Scan statistics with every task counted as planned.
    pub summary: ScanResult,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Drives one run over a [`RunConfig`].
pub struct Organizer {
    config: RunConfig,
    table: CategoryTable,
    labels: LabelSet,
    cancel: CancelToken,
}

impl Organizer {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            table: CategoryTable::default(),
            labels: LabelSet::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_categories(mut self, table: CategoryTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Scans and plans, then executes the plan.
    pub fn run(&self) -> OrganizeResult<ScanResult> {
        let plan = self.scan()?;
        self.execute(&plan)
    }

    /// Walks every root and computes the plan. Never writes anything.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::WorkerPool`] if the thread pool cannot start.
    pub fn scan(&self) -> OrganizeResult<Plan> {
        self.scan_with(&NoProgress)
    }

    /// [`Organizer::scan`], reporting each categorized file to `progress`.
    pub fn scan_with(&self, progress: &dyn ProgressSink) -> OrganizeResult<Plan> {
        let pool = self.pool()?;
        let output_root = self.config.output_root();
        let mut planner =
            LinkPlanner::new(output_root, self.table.clone(), self.labels.clone());
        let walker = Category::ALL
            .iter()
            .fold(DirectoryWalker::new(self.config.exclusions()), |walker, category| {
                walker.skip_dir(output_root.join(category.dir_name()))
            })
            .with_cancel(&self.cancel);

        info!(roots = self.config.scan_roots().len(), workers = self.config.workers(), "scanning");
        let scans: Vec<(ScanResult, Vec<SourceFile>)> = pool.install(|| {
            self.config
                .scan_roots()
                .par_iter()
                .map(|root| self.scan_root(&walker, &planner, progress, root))
                .collect()
        });

        let mut summary = ScanResult::new(self.config.mode());
        let mut files = Vec::new();
        for (partial, found) in scans {
            summary = summary.merge(partial);
            files.extend(found);
        }

        let tasks = planner.plan_all(files);
        for task in &tasks {
            summary.record_planned(task);
        }
        summary.cancelled |= self.cancel.is_cancelled();
        info!(tasks = tasks.len(), unsupported = summary.unsupported, "plan ready");

        Ok(Plan { tasks, summary })
    }

    /// Executes `plan` in this run's mode and returns the final result.
    ///
    /// # Errors
    ///
    /// When applying, returns [`OrganizeError::OutputRoot`] if the output
    /// root cannot be created; no task runs in that case.
    pub fn execute(&self, plan: &Plan) -> OrganizeResult<ScanResult> {
        self.execute_with(plan, &NoProgress)
    }

    /// [`Organizer::execute`], reporting each finished task to `progress`.
    pub fn execute_with(
        &self,
        plan: &Plan,
        progress: &dyn ProgressSink,
    ) -> OrganizeResult<ScanResult> {
        let mode = self.config.mode();
        if mode == ExecutionMode::Apply {
            prepare_output_root(self.config.output_root())?;
        }

        let pool = self.pool()?;
        let executor = LinkExecutor::new(mode);

        info!(tasks = plan.tasks.len(), ?mode, "executing plan");
        let executed = pool.install(|| {
            plan.tasks
                .par_iter()
                .fold(
                    || ScanResult::new(mode),
                    |mut acc, task| {
                        if self.cancel.is_cancelled() {
                            acc.cancelled = true;
                            return acc;
                        }
                        let outcome = executor.execute(task);
                        progress.task_done(task, &outcome);
                        acc.record(task, &outcome);
                        acc
                    },
                )
                .reduce(|| ScanResult::new(mode), ScanResult::merge)
        });

        Ok(plan.summary.clone().merge(executed).finish())
    }

    fn scan_root(
        &self,
        walker: &DirectoryWalker<'_>,
        planner: &LinkPlanner,
        progress: &dyn ProgressSink,
        root: &Path,
    ) -> (ScanResult, Vec<SourceFile>) {
        let mut partial = ScanResult::new(self.config.mode());
        let mut found = Vec::new();

        if self.cancel.is_cancelled() {
            debug!(root = %root.display(), "cancelled before start");
            partial.cancelled = true;
            return (partial, found);
        }

        info!(root = %root.display(), "scanning root");
        let mut walk = walker.walk(root);
        for candidate in walk.by_ref() {
            partial.files_seen += 1;
            match planner.prepare(candidate) {
                Some(file) => {
                    progress.file_found(&file);
                    found.push(file);
                }
                None => partial.unsupported += 1,
            }
        }

        partial.system_files = walk.system_files();
        partial.warnings = walk.into_warnings();
        partial.roots_scanned = 1;
        partial.cancelled = self.cancel.is_cancelled();
        info!(
            root = %root.display(),
            files = partial.files_seen,
            categorized = found.len(),
            warnings = partial.warnings.len(),
            "finished root"
        );
        (partial, found)
    }

    fn pool(&self) -> OrganizeResult<ThreadPool> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.workers())
            .thread_name(|i| format!("symsort-worker-{i}"))
            .build()?;
        Ok(pool)
    }
}

fn prepare_output_root(output_root: &Path) -> OrganizeResult<()> {
    fs::create_dir_all(output_root).map_err(|source| OrganizeError::OutputRoot {
        path: output_root.to_path_buf(),
        source,
    })
}
