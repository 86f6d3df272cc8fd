//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored messages,
//! progress feedback while scanning and linking, the plan listing and the
//! final summary tables.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::aggregate::ScanResult;
use crate::file_category::Category;
use crate::file_linker::{ExecutionMode, TaskOutcome};
use crate::organizer::{Plan, ProgressSink};
use crate::planner::{LinkTask, SourceFile};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner that counts categorized files while scanning.
    pub fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Creates a progress bar for link creation.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Prints every planned link, one per line.
    pub fn plan_listing(plan: &Plan, mode: ExecutionMode) {
        let verb = if mode.is_dry_run() {
            "Would link"
        } else {
            "Will link"
        };
        for task in &plan.tasks {
            println!(
                "  {}: {} {} {}",
                verb,
                task.source.display(),
                "->".dimmed(),
                task.target.display()
            );
        }
    }

    /// Prints the per-category table for a plan or a finished run.
    pub fn summary_table(result: &ScanResult) {
        Self::header("SUMMARY");

        let width = Category::ALL
            .iter()
            .map(|c| c.description().len())
            .max()
            .unwrap_or(0)
            .max(8);

        let applied = result.mode == ExecutionMode::Apply && result.finished_at.is_some();
        if applied {
            println!(
                "{:<width$} | {:>8} | {:>8} | {:>8} | {:>8}",
                "Category".bold(),
                "Planned".bold(),
                "Created".bold(),
                "Skipped".bold(),
                "Failed".bold(),
                width = width
            );
            println!("{}", "-".repeat(width + 48));
            for category in Category::ALL {
                let tally = result.tally(category);
                println!(
                    "{:<width$} | {:>8} | {:>8} | {:>8} | {:>8}",
                    category.description(),
                    tally.planned,
                    tally.created.to_string().green(),
                    tally.skipped_identical,
                    Self::failed_count(tally.failed),
                    width = width
                );
            }
            let total = result.total();
            println!("{}", "-".repeat(width + 48));
            println!(
                "{:<width$} | {:>8} | {:>8} | {:>8} | {:>8}",
                "Total".bold(),
                total.planned,
                total.created.to_string().green().bold(),
                total.skipped_identical,
                Self::failed_count(total.failed),
                width = width
            );
        } else {
            println!(
                "{:<width$} | {}",
                "Category".bold(),
                "Files".bold(),
                width = width
            );
            println!("{}", "-".repeat(width + 10));
            for category in Category::ALL {
                let count = result.tally(category).planned;
                println!(
                    "{:<width$} | {} {}",
                    category.description(),
                    count.to_string().green(),
                    if count == 1 { "file" } else { "files" },
                    width = width
                );
            }
            let total = result.total().planned;
            println!("{}", "-".repeat(width + 10));
            println!(
                "{:<width$} | {} {}",
                "Total".bold(),
                total.to_string().green().bold(),
                if total == 1 { "file" } else { "files" },
                width = width
            );
        }

        println!(
            "\nScanned {} root(s), {} file(s); {} skipped as unsupported type.",
            result.roots_scanned, result.files_seen, result.unsupported
        );
        if result.system_files > 0 {
            println!("Skipped {} system file(s).", result.system_files);
        }
    }

    /// Prints skipped subtrees and failed links with their reasons.
    pub fn problems(result: &ScanResult) {
        if !result.warnings.is_empty() {
            Self::header(&format!("SKIPPED DIRECTORIES ({})", result.warnings.len()));
            for warning in &result.warnings {
                println!(
                    "  {} {}: {}",
                    "⚠".yellow(),
                    warning.path.display(),
                    warning.message
                );
            }
        }

        if !result.failures.is_empty() {
            Self::header(&format!("FAILED ({})", result.failures.len()));
            for failure in &result.failures {
                eprintln!(
                    "  {} {}: {}",
                    "✗".red(),
                    failure.source.display(),
                    failure.reason
                );
            }
        }
    }

    fn failed_count(count: u64) -> ColoredString {
        if count > 0 {
            count.to_string().red()
        } else {
            count.to_string().normal()
        }
    }
}

/// Feeds a progress bar or spinner from worker threads.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressSink for BarProgress {
    fn file_found(&self, file: &SourceFile) {
        self.bar.inc(1);
        let found = self.bar.position();
        if found == 1 || found % 100 == 0 {
            self.bar.set_message(format!(
                "Found {} files... (last: {}/{})",
                found,
                file.category,
                file.path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default()
            ));
        }
    }

    fn task_done(&self, _task: &LinkTask, outcome: &TaskOutcome) {
        if let TaskOutcome::Failed(_) = outcome {
            self.bar.set_message("some links failed".red().to_string());
        }
        self.bar.inc(1);
    }
}
