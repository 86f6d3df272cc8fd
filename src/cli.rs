//! Command-line interface module for symsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing into a [`RunConfig`]
//! - Confirmation prompts before anything is written
//! - Orchestrating the scan, plan and link phases with progress feedback
//! - Rendering the final report and mapping it to an exit code

use clap::{ArgAction, Parser};
use indicatif::ProgressBar;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

use crate::aggregate::ScanResult;
use crate::config::RunConfig;
use crate::error::OrganizeResult;
use crate::file_linker::ExecutionMode;
use crate::logging::init_logger;
use crate::organizer::{CancelToken, Organizer};
use crate::output::{BarProgress, OutputFormatter};
use crate::planner::LinkTask;
use crate::platform::{LinkPrivilege, SymlinkProbe, discover_roots, normalize_root_arg};

/// Exit status for an interrupted run, as a shell reports SIGINT.
pub const EXIT_INTERRUPTED: u8 = 130;

/// Collects media and documents scattered across disks into one categorized
/// tree of symbolic links. Source files are never moved or modified.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "symsort",
    version,
    about = "Link pictures, audio, video and documents into one categorized tree",
    after_help = "Examples:\n  symsort --dry-run --list\n  symsort --output ~/Sorted --drives ~/Downloads ~/Desktop\n  symsort --exclude Backups --exclude '*.photoslibrary' --yes"
)]
pub struct Cli {
    /// Plan and report without creating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Directory that receives the category folders
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub output: PathBuf,

    /// Roots to scan (drive letters on Windows); defaults to every discoverable root
    #[arg(long, value_name = "ROOT", num_args = 1..)]
    pub drives: Vec<String>,

    /// Extra directory name or glob to skip (repeatable)
    #[arg(long, value_name = "NAME|GLOB")]
    pub exclude: Vec<String>,

    /// Number of worker threads
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the result as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Print every planned link
    #[arg(long)]
    pub list: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Roots named on the command line, or the discovered defaults.
    pub fn scan_roots(&self) -> Vec<PathBuf> {
        if self.drives.is_empty() {
            discover_roots()
        } else {
            self.drives.iter().map(|d| normalize_root_arg(d)).collect()
        }
    }

    /// Builds the validated run configuration.
    ///
    /// # Errors
    ///
    /// Propagates any fatal validation error from [`RunConfig::new`] or
    /// [`RunConfig::with_excludes`].
    pub fn to_config(&self) -> OrganizeResult<RunConfig> {
        let mode = ExecutionMode::from_dry_run(self.dry_run);
        let mut config =
            RunConfig::new(self.scan_roots(), &self.output, mode)?.with_excludes(&self.exclude)?;
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        Ok(config)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunStatus {
    /// Every planned task reached a terminal state.
    Completed(ScanResult),
    /// Cancelled part way; the result is partial.
    Interrupted(ScanResult),
    /// The operator answered no; nothing was written.
    Declined,
}

impl RunStatus {
    pub fn exit_status(&self) -> u8 {
        match self {
            RunStatus::Completed(_) | RunStatus::Declined => 0,
            RunStatus::Interrupted(_) => EXIT_INTERRUPTED,
        }
    }

    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            RunStatus::Completed(result) | RunStatus::Interrupted(result) => Some(result),
            RunStatus::Declined => None,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    result: &'a ScanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<&'a [LinkTask]>,
}

/// Asks a yes/no question on stdout until it gets an answer.
///
/// An empty answer picks `default`; with no default the question repeats.
pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            // stdin closed
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => {
                if let Some(default) = default {
                    return Ok(default);
                }
            }
            _ => {}
        }
    }
}

/// Runs the application for parsed arguments and returns the process exit
/// code.
///
/// Installs logging and a Ctrl-C handler, then delegates to
/// [`execute_cli`] with interactive prompts on stdin.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use symsort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["symsort", "--dry-run", "--drives", "/home/me"]);
/// let code = run_cli(&cli);
/// ```
pub fn run_cli(cli: &Cli) -> ExitCode {
    init_logger(cli.verbose);

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %err, "could not install Ctrl-C handler");
    }

    let mut confirm = |prompt: &str| prompt_confirm(prompt, Some(false));
    match execute_cli(cli, cancel, &mut confirm) {
        Ok(status) => ExitCode::from(status.exit_status()),
        Err(err) => {
            OutputFormatter::error(&format!("Error: {}", err));
            ExitCode::from(1)
        }
    }
}

/// Drives one complete run: configure, scan, confirm, execute and report.
///
/// `confirm` answers every yes/no question; it is never called with
/// `--yes`. A failed prompt counts as a "no".
///
/// # Errors
///
/// Returns the fatal [`crate::OrganizeError`] that stopped the run before any
/// link was created.
pub fn execute_cli(
    cli: &Cli,
    cancel: CancelToken,
    confirm: &mut dyn FnMut(&str) -> io::Result<bool>,
) -> OrganizeResult<RunStatus> {
    let config = cli.to_config()?;
    let mode = config.mode();
    let quiet = cli.json;

    if !quiet {
        OutputFormatter::header(&format!("symsort {}", env!("CARGO_PKG_VERSION")));
        for root in config.scan_roots() {
            OutputFormatter::info(&format!("Scanning: {}", root.display()));
        }
        OutputFormatter::info(&format!("Output:   {}", config.output_root().display()));
        if mode.is_dry_run() {
            OutputFormatter::dry_run_notice("No links will be created.");
        }
    }

    if mode == ExecutionMode::Apply && !SymlinkProbe.has_link_creation_privilege() {
        OutputFormatter::warning(
            "This process cannot create symbolic links. Run elevated or enable Developer Mode.",
        );
        if !cli.yes && !ask(confirm, "Continue anyway?") {
            return Ok(RunStatus::Declined);
        }
    }

    let organizer = Organizer::new(config).with_cancel(cancel);
    let output_root = organizer.config().output_root().to_path_buf();

    let scan_progress = BarProgress::new(if quiet {
        ProgressBar::hidden()
    } else {
        OutputFormatter::create_spinner()
    });
    let plan = organizer.scan_with(&scan_progress);
    scan_progress.bar().finish_and_clear();
    let plan = plan?;

    let listing = cli.list.then_some(plan.tasks.as_slice());
    if plan.summary.cancelled {
        let result = plan.summary.clone().finish();
        report(cli, &result, listing);
        return Ok(RunStatus::Interrupted(result));
    }

    if !quiet {
        if cli.list {
            OutputFormatter::plan_listing(&plan, mode);
        }
        OutputFormatter::plain(&format!("\nPlanned {} link(s).", plan.tasks.len()));
    }

    if mode == ExecutionMode::Apply && !plan.is_empty() && !cli.yes {
        let prompt = format!(
            "Create {} symbolic link(s) under {}?",
            plan.tasks.len(),
            output_root.display()
        );
        if !ask(confirm, &prompt) {
            if !quiet {
                OutputFormatter::plain("Aborted. Nothing was changed.");
            }
            return Ok(RunStatus::Declined);
        }
    }

    let exec_progress = BarProgress::new(if quiet || plan.is_empty() || mode.is_dry_run() {
        ProgressBar::hidden()
    } else {
        OutputFormatter::create_progress_bar(plan.tasks.len() as u64)
    });
    let result = organizer.execute_with(&plan, &exec_progress);
    exec_progress.bar().finish_and_clear();
    let result = result?;

    report(cli, &result, listing);
    if result.cancelled {
        Ok(RunStatus::Interrupted(result))
    } else {
        Ok(RunStatus::Completed(result))
    }
}

fn ask(confirm: &mut dyn FnMut(&str) -> io::Result<bool>, prompt: &str) -> bool {
    confirm(prompt).unwrap_or_else(|err| {
        warn!(error = %err, "could not read answer, assuming no");
        false
    })
}

fn report(cli: &Cli, result: &ScanResult, plan: Option<&[LinkTask]>) {
    if cli.json {
        let report = JsonReport { result, plan };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => OutputFormatter::error(&format!("Could not serialize result: {}", err)),
        }
        return;
    }

    OutputFormatter::summary_table(result);
    OutputFormatter::problems(result);

    if result.cancelled {
        OutputFormatter::warning("Interrupted. The counts above are partial.");
    } else if result.mode.is_dry_run() {
        OutputFormatter::success("Dry run complete. No files were modified.");
        OutputFormatter::plain("Run again without --dry-run to create the links.");
    } else if result.has_failures() {
        OutputFormatter::warning("Some links could not be created. See the list above.");
    } else {
        OutputFormatter::success("Organization complete!");
    }
}
