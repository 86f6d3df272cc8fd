//! Integration tests for symsort
//!
//! These tests build real directory trees in temporary directories and run
//! complete scans through the public API and the CLI driver.
//!
//! Test categories:
//! 1. Planning and collision handling
//! 2. Exclusion of system, hidden and user-named directories
//! 3. Dry-run side-effect freedom
//! 4. Applying plans: link creation, idempotence, conflicts
//! 5. CLI driver: prompts, fatal errors, cancellation
use clap::Parser;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use symsort::cli::{Cli, EXIT_INTERRUPTED, RunStatus, execute_cli, run_cli};
use symsort::{
    CancelToken, Category, ExecutionMode, OrganizeError, Organizer, Plan, RunConfig, ScanResult,
};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary workspace holding any number of scan roots and one output
/// directory, all side by side.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the fixture.
    fn at(&self, rel: &str) -> PathBuf {
        self.path().join(rel)
    }

    /// Create a file (and its parent directories) with `content`.
    fn create_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.at(rel);
        fs::create_dir_all(path.parent().expect("file has a parent"))
            .expect("Failed to create parent directories");
        fs::write(&path, content).expect("Failed to write file content");
        path
    }

    fn create_dir(&self, rel: &str) -> PathBuf {
        let path = self.at(rel);
        fs::create_dir_all(&path).expect("Failed to create directory");
        path
    }

    fn output(&self) -> PathBuf {
        self.at("out")
    }

    fn config(&self, roots: &[&str], mode: ExecutionMode) -> RunConfig {
        let roots = roots.iter().map(|r| self.at(r)).collect::<Vec<_>>();
        RunConfig::new(roots, self.output(), mode).expect("valid config")
    }

    fn plan(&self, roots: &[&str]) -> Plan {
        Organizer::new(self.config(roots, ExecutionMode::DryRun))
            .scan()
            .expect("scan succeeds")
    }

    fn run(&self, roots: &[&str], mode: ExecutionMode) -> ScanResult {
        Organizer::new(self.config(roots, mode))
            .run()
            .expect("run succeeds")
    }

    /// Every path under the output root, sorted, relative to it.
    fn output_entries(&self) -> Vec<PathBuf> {
        let out = self.output();
        if !out.exists() {
            return Vec::new();
        }
        let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(&out)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| e.path().strip_prefix(&out).unwrap().to_path_buf())
            .collect();
        entries.sort();
        entries
    }
}

/// Output-relative targets of a plan, in plan order.
fn targets(plan: &Plan, output: &Path) -> Vec<PathBuf> {
    let output = output
        .canonicalize()
        .unwrap_or_else(|_| output.to_path_buf());
    plan.tasks
        .iter()
        .map(|t| t.target.strip_prefix(&output).unwrap().to_path_buf())
        .collect()
}

fn rel(path: &str) -> PathBuf {
    path.split('/').collect()
}

fn never_asked(prompt: &str) -> io::Result<bool> {
    panic!("unexpected prompt: {prompt}");
}

// ============================================================================
// Planning and Collision Tests
// ============================================================================

#[test]
fn test_same_name_in_two_roots_gets_suffix_by_source_order() {
    let fixture = TestFixture::new();
    fixture.create_file("X/Documents/photo.jpg", "x");
    fixture.create_file("Y/Documents/photo.jpg", "y");

    let plan = fixture.plan(&["Y", "X"]);

    assert_eq!(
        targets(&plan, &fixture.output()),
        vec![
            rel("pictures/Documents/photo.jpg"),
            rel("pictures/Documents/photo_1.jpg"),
        ]
    );
    assert!(plan.tasks[0].source.starts_with(fixture.at("X").canonicalize().unwrap()));
    assert_eq!(plan.tasks[1].suffix, Some(1));
}

#[test]
fn test_collision_suffixes_stable_across_runs_and_worker_counts() {
    let fixture = TestFixture::new();
    for root in ["A", "B", "C", "D"] {
        for i in 0..5 {
            fixture.create_file(&format!("{root}/Music/sub{i}/track.mp3"), root);
        }
    }

    let roots = ["A", "B", "C", "D"];
    let baseline = Organizer::new(fixture.config(&roots, ExecutionMode::DryRun).with_workers(1))
        .scan()
        .unwrap();
    assert_eq!(baseline.tasks.len(), 20);

    for workers in [2, 4, 8] {
        for _ in 0..3 {
            let plan = Organizer::new(
                fixture
                    .config(&roots, ExecutionMode::DryRun)
                    .with_workers(workers),
            )
            .scan()
            .unwrap();
            assert_eq!(plan.tasks, baseline.tasks);
        }
    }

    let names: std::collections::HashSet<_> = baseline.tasks.iter().map(|t| &t.target).collect();
    assert_eq!(names.len(), 20, "every target path is unique");
}

#[test]
fn test_labels_prefer_well_known_ancestors() {
    let fixture = TestFixture::new();
    fixture.create_file("home/Downloads/trip/2019/beach.png", "p");
    fixture.create_file("home/projects/notes/todo.md", "t");
    fixture.create_file("home/Videos/clip.mkv", "v");

    let plan = fixture.plan(&["home"]);

    assert_eq!(
        targets(&plan, &fixture.output()),
        vec![
            rel("pictures/Downloads/beach.png"),
            rel("video/Videos/clip.mkv"),
            rel("text/notes/todo.md"),
        ]
    );
}

#[test]
fn test_unsupported_extensions_counted_not_planned() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Music/song.MP3", "a");
    fixture.create_file("src/Music/cover.unknownext", "?");
    fixture.create_file("src/Music/NOEXT", "?");

    let plan = fixture.plan(&["src"]);

    assert_eq!(plan.tasks.len(), 1);
    assert_eq!(plan.tasks[0].category, Category::Audio);
    assert_eq!(plan.summary.files_seen, 3);
    assert_eq!(plan.summary.unsupported, 2);
}

#[test]
fn test_overlapping_roots_plan_each_file_once() {
    let fixture = TestFixture::new();
    fixture.create_file("top/Pictures/a.jpg", "a");
    fixture.create_file("top/Pictures/inner/b.jpg", "b");

    let plan = fixture.plan(&["top", "top/Pictures", "top/Pictures/inner"]);

    assert_eq!(plan.tasks.len(), 2);
    assert_eq!(plan.summary.roots_scanned, 1);
    assert!(plan.tasks.iter().all(|t| t.suffix.is_none()));
}

// ============================================================================
// Exclusion Tests
// ============================================================================

#[test]
fn test_denylisted_directory_is_pruned() {
    let fixture = TestFixture::new();
    fixture.create_file("X/node_modules/readme.txt", "r");
    fixture.create_file("X/node_modules/pkg/deep/notes.md", "n");

    let plan = fixture.plan(&["X"]);

    assert!(plan.is_empty());
    assert_eq!(plan.summary.tally(Category::Text).planned, 0);
    assert_eq!(plan.summary.files_seen, 0);
}

#[test]
fn test_hidden_directory_is_pruned() {
    let fixture = TestFixture::new();
    fixture.create_file("X/.git/config", "c");
    fixture.create_file("X/.git/logs/notes.txt", "n");

    let plan = fixture.plan(&["X"]);

    assert!(plan.is_empty());
}

#[test]
fn test_no_planned_source_lies_under_an_excluded_directory() {
    let fixture = TestFixture::new();
    let excluded = [
        "AppData", "Temp", "node_modules", "__pycache__", "target", ".cache", "Program Files",
        "$Recycle.Bin", "build", "venv",
    ];
    for dir in excluded {
        fixture.create_file(&format!("root/Documents/{dir}/hidden.pdf"), "x");
        fixture.create_file(&format!("root/Documents/{dir}/nested/Music/song.mp3"), "x");
    }
    fixture.create_file("root/Documents/keep.pdf", "k");
    fixture.create_file("root/Documents/Backups/old.pdf", "b");
    fixture.create_file("root/Library.photoslibrary/img.jpg", "i");

    let config = fixture
        .config(&["root"], ExecutionMode::DryRun)
        .with_excludes(&["backups", "*.photoslibrary"])
        .unwrap();
    let plan = Organizer::new(config).scan().unwrap();

    assert_eq!(plan.tasks.len(), 1);
    assert!(plan.tasks[0].source.ends_with("Documents/keep.pdf"));
    for task in &plan.tasks {
        for component in task.source.components() {
            let name = component.as_os_str().to_string_lossy().to_lowercase();
            assert!(!excluded.iter().any(|d| d.to_lowercase() == name));
        }
    }
}

#[test]
fn test_output_inside_root_is_not_rescanned() {
    let fixture = TestFixture::new();
    fixture.create_file("Music/a.mp3", "a");
    let output = fixture.create_dir("Music/sorted");
    fixture.create_file("Music/sorted/audio/Music/stray.mp3", "s");

    let config = RunConfig::new(
        vec![fixture.at("Music")],
        &output,
        ExecutionMode::DryRun,
    )
    .unwrap();
    let plan = Organizer::new(config).scan().unwrap();

    assert_eq!(plan.tasks.len(), 1);
    assert!(plan.tasks[0].source.ends_with("a.mp3"));
}

#[test]
fn test_output_equal_to_root_still_scans_root() {
    let fixture = TestFixture::new();
    let home = fixture.create_dir("home");
    fixture.create_file("home/Music/a.mp3", "a");
    fixture.create_file("home/Photos/b.jpg", "b");
    fixture.create_file("home/video/Videos/old.mkv", "generated earlier");

    let config = RunConfig::new(vec![home.clone()], &home, ExecutionMode::DryRun).unwrap();
    let plan = Organizer::new(config).scan().unwrap();

    assert_eq!(plan.summary.roots_scanned, 1);
    assert_eq!(plan.tasks.len(), 2);
    assert_eq!(
        targets(&plan, &home),
        vec![rel("audio/Music/a.mp3"), rel("pictures/Photos/b.jpg")]
    );
}

#[cfg(unix)]
#[test]
fn test_output_equal_to_root_reapply_is_idempotent() {
    let fixture = TestFixture::new();
    let home = fixture.create_dir("home");
    fixture.create_file("home/Music/a.mp3", "a");
    fixture.create_file("home/Photos/b.jpg", "b");

    let run = || {
        let config = RunConfig::new(vec![home.clone()], &home, ExecutionMode::Apply).unwrap();
        Organizer::new(config).run().unwrap()
    };
    let first = run();
    let second = run();

    assert_eq!(first.total().created, 2);
    assert_eq!(second.total().planned, 2);
    assert_eq!(second.total().skipped_identical, 2);
    assert!(!second.has_failures());
}

// ============================================================================
// Dry-Run Tests
// ============================================================================

#[test]
fn test_dry_run_reports_plan_and_leaves_output_unchanged() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Music/song.mp3", "a");
    fixture.create_file("src/Music/blob.unknownext", "?");
    fixture.create_file("out/existing.txt", "keep");
    let before = fixture.output_entries();

    let result = fixture.run(&["src"], ExecutionMode::DryRun);

    assert_eq!(result.tally(Category::Audio).planned, 1);
    assert_eq!(result.total().planned, 1);
    assert_eq!(result.total().created, 0);
    assert_eq!(result.unsupported, 1);
    assert!(!result.has_failures());
    assert_eq!(fixture.output_entries(), before);
}

#[test]
fn test_dry_run_does_not_create_missing_output_root() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Pictures/a.png", "a");

    let result = fixture.run(&["src"], ExecutionMode::DryRun);

    assert_eq!(result.total().planned, 1);
    assert!(!fixture.output().exists());
}

// ============================================================================
// Apply Tests
// ============================================================================

#[cfg(unix)]
#[test]
fn test_apply_creates_links_to_sources() {
    let fixture = TestFixture::new();
    let song = fixture.create_file("src/Music/song.mp3", "audio bytes");
    fixture.create_file("src/Desktop/report.pdf", "pdf bytes");

    let result = fixture.run(&["src"], ExecutionMode::Apply);

    assert_eq!(result.total().created, 2);
    assert!(!result.has_failures());
    assert_eq!(
        fixture.output_entries(),
        vec![
            rel("audio"),
            rel("audio/Music"),
            rel("audio/Music/song.mp3"),
            rel("text"),
            rel("text/Desktop"),
            rel("text/Desktop/report.pdf"),
        ]
    );

    let link = fixture.output().join("audio/Music/song.mp3");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(
        fs::read_link(&link).unwrap(),
        song.canonicalize().unwrap()
    );
    assert_eq!(fs::read_to_string(&link).unwrap(), "audio bytes");
}

#[cfg(unix)]
#[test]
fn test_reapply_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_file("X/Documents/photo.jpg", "x");
    fixture.create_file("Y/Documents/photo.jpg", "y");
    fixture.create_file("Y/Music/a.flac", "f");

    let first = fixture.run(&["X", "Y"], ExecutionMode::Apply);
    let after_first = fixture.output_entries();
    let second = fixture.run(&["X", "Y"], ExecutionMode::Apply);

    assert_eq!(first.total().created, 3);
    assert_eq!(second.total().created, 0);
    assert_eq!(second.total().skipped_identical, 3);
    assert!(!second.has_failures());
    assert_eq!(fixture.output_entries(), after_first);
}

#[cfg(unix)]
#[test]
fn test_apply_never_modifies_sources() {
    let fixture = TestFixture::new();
    let files = [
        fixture.create_file("src/Pictures/a.jpg", "jpeg"),
        fixture.create_file("src/Music/b.ogg", "ogg"),
        fixture.create_file("src/Videos/c.webm", "webm"),
    ];
    let before: Vec<_> = files
        .iter()
        .map(|f| {
            let meta = fs::metadata(f).unwrap();
            (fs::read(f).unwrap(), meta.len(), meta.modified().unwrap())
        })
        .collect();

    fixture.run(&["src"], ExecutionMode::Apply);

    for (file, (bytes, len, modified)) in files.iter().zip(before) {
        let meta = fs::symlink_metadata(file).unwrap();
        assert!(meta.file_type().is_file());
        assert_eq!(meta.len(), len);
        assert_eq!(meta.modified().unwrap(), modified);
        assert_eq!(fs::read(file).unwrap(), bytes);
    }
}

#[cfg(unix)]
#[test]
fn test_existing_target_fails_without_overwrite() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Music/a.mp3", "a");
    fixture.create_file("src/Music/b.mp3", "b");
    fixture.create_file("out/audio/Music/a.mp3", "occupant");

    let result = fixture.run(&["src"], ExecutionMode::Apply);

    assert_eq!(result.tally(Category::Audio).created, 1);
    assert_eq!(result.tally(Category::Audio).failed, 1);
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].source.ends_with("a.mp3"));
    assert_eq!(result.failures[0].reason, "target exists, would overwrite");
    assert_eq!(
        fs::read_to_string(fixture.output().join("audio/Music/a.mp3")).unwrap(),
        "occupant"
    );
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_followed() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Music/a.mp3", "a");
    fixture.create_file("elsewhere/Pictures/b.png", "b");
    std::os::unix::fs::symlink(fixture.at("elsewhere"), fixture.at("src/link")).unwrap();
    std::os::unix::fs::symlink(fixture.at("src"), fixture.at("src/Music/loop")).unwrap();

    let plan = fixture.plan(&["src"]);

    assert_eq!(plan.tasks.len(), 1);
    assert_eq!(plan.tasks[0].category, Category::Audio);
}

// ============================================================================
// CLI Driver Tests
// ============================================================================

fn cli_for(fixture: &TestFixture, extra: &[&str]) -> Cli {
    let output = fixture.output();
    let root = fixture.at("src");
    let mut args = vec![
        "symsort".to_string(),
        "--json".to_string(),
        "--output".to_string(),
        output.display().to_string(),
        "--drives".to_string(),
        root.display().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Cli::parse_from(args)
}

#[test]
fn test_cli_dry_run_completes_without_prompting() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Pictures/a.gif", "g");

    let cli = cli_for(&fixture, &["--dry-run", "--list"]);
    let status = execute_cli(&cli, CancelToken::new(), &mut never_asked).unwrap();

    assert_eq!(status.exit_status(), 0);
    let result = status.result().unwrap();
    assert_eq!(result.mode, ExecutionMode::DryRun);
    assert_eq!(result.tally(Category::Pictures).planned, 1);
    assert!(!fixture.output().exists());
}

#[cfg(unix)]
#[test]
fn test_cli_declined_prompt_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Pictures/a.gif", "g");

    let cli = cli_for(&fixture, &[]);
    let mut prompts = Vec::new();
    let status = execute_cli(&cli, CancelToken::new(), &mut |prompt: &str| -> io::Result<bool> {
        prompts.push(prompt.to_string());
        Ok(false)
    })
    .unwrap();

    assert!(matches!(status, RunStatus::Declined));
    assert_eq!(status.exit_status(), 0);
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("1 symbolic link"));
    assert!(!fixture.output().exists());
}

#[test]
fn test_cli_failed_prompt_counts_as_no() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Pictures/a.gif", "g");

    let cli = cli_for(&fixture, &[]);
    let status = execute_cli(&cli, CancelToken::new(), &mut |_: &str| -> io::Result<bool> {
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
    })
    .unwrap();

    assert!(matches!(status, RunStatus::Declined));
    assert!(!fixture.output().exists());
}

#[cfg(unix)]
#[test]
fn test_cli_yes_applies_plan() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Music/a.wav", "w");

    let cli = cli_for(&fixture, &["--yes", "--workers", "2"]);
    let status = execute_cli(&cli, CancelToken::new(), &mut never_asked).unwrap();

    let result = status.result().unwrap();
    assert_eq!(result.tally(Category::Audio).created, 1);
    assert!(fixture.output().join("audio/Music/a.wav").exists());
}

#[test]
fn test_cli_fatal_when_no_valid_roots() {
    let fixture = TestFixture::new();

    let cli = cli_for(&fixture, &["--dry-run"]);
    let err = execute_cli(&cli, CancelToken::new(), &mut never_asked).unwrap_err();

    assert!(matches!(err, OrganizeError::NoScanRoots));
}

#[test]
fn test_cli_fatal_when_output_is_a_file() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Music/a.mp3", "a");
    fixture.create_file("out", "not a directory");

    let cli = cli_for(&fixture, &["--yes"]);
    let err = execute_cli(&cli, CancelToken::new(), &mut never_asked).unwrap_err();

    assert!(matches!(err, OrganizeError::OutputNotADirectory { .. }));
    assert_eq!(fs::read_to_string(fixture.output()).unwrap(), "not a directory");
}

#[test]
fn test_uncreatable_output_root_is_fatal_when_applying() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Music/a.mp3", "a");
    fixture.create_file("out", "not a directory");
    let output = fixture.output().join("sub");

    let config = RunConfig::new(vec![fixture.at("src")], &output, ExecutionMode::Apply).unwrap();
    let err = Organizer::new(config).run().unwrap_err();

    assert!(matches!(err, OrganizeError::OutputRoot { .. }));
    assert!(fs::symlink_metadata(output.join("audio/Music/a.mp3")).is_err());
    assert_eq!(fs::read_to_string(fixture.output()).unwrap(), "not a directory");

    let cli = Cli::parse_from([
        "symsort".to_string(),
        "--yes".to_string(),
        "--json".to_string(),
        "--output".to_string(),
        output.display().to_string(),
        "--drives".to_string(),
        fixture.at("src").display().to_string(),
    ]);
    assert_eq!(run_cli(&cli), ExitCode::from(1));
}

#[test]
fn test_cli_fatal_on_bad_exclude_glob() {
    let fixture = TestFixture::new();
    fixture.create_dir("src");

    let cli = cli_for(&fixture, &["--dry-run", "--exclude", "[broken"]);
    let err = execute_cli(&cli, CancelToken::new(), &mut never_asked).unwrap_err();

    assert!(matches!(err, OrganizeError::InvalidPattern { .. }));
}

#[test]
fn test_cli_cancelled_run_reports_partial_result() {
    let fixture = TestFixture::new();
    fixture.create_file("src/Music/a.mp3", "a");

    let cancel = CancelToken::new();
    cancel.cancel();
    let cli = cli_for(&fixture, &["--yes"]);
    let status = execute_cli(&cli, cancel, &mut never_asked).unwrap();

    assert!(matches!(status, RunStatus::Interrupted(_)));
    assert_eq!(status.exit_status(), EXIT_INTERRUPTED);
    assert!(status.result().unwrap().cancelled);
    assert!(!fixture.output().exists());
}
