//! symsort - collect scattered media and documents into one categorized tree
//!
//! This library walks one or more scan roots, classifies every regular file by
//! extension into a [`Category`], and plans one symbolic link per file under
//! `<output>/<category>/<label>/<name>`. Plans can be reported without touching
//! the filesystem (dry run) or applied. Sources are never moved, renamed or
//! modified.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod file_category;
pub mod file_linker;
pub mod logging;
pub mod organizer;
pub mod output;
pub mod planner;
pub mod platform;
pub mod walker;

pub use aggregate::{CategoryTally, FailureRecord, ScanResult};
pub use config::RunConfig;
pub use error::{LinkError, OrganizeError, OrganizeResult};
pub use exclusion::ExclusionFilter;
pub use file_category::{Category, CategoryTable};
pub use file_linker::{ExecutionMode, LinkExecutor, TaskOutcome};
pub use organizer::{CancelToken, Organizer, Plan, ProgressSink};
pub use planner::{LabelSet, LinkPlanner, LinkTask, SourceFile};
pub use walker::{DirectoryWalker, ScanWarning, WarningKind};

pub use cli::{Cli, run_cli};
