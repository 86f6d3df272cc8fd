//! Link planning: from candidate files to conflict-free target paths.
//!
//! Planning is split in two so it can run under parallel traversal:
//!
//! 1. [`LinkPlanner::prepare`] classifies one candidate and derives its
//!    source-folder label. It only reads the planner, so every worker can
//!    call it at once.
//! 2. [`LinkPlanner::plan_all`] is the single collision-resolution stage. It
//!    orders every prepared file by source path and assigns target paths,
//!    appending `_1`, `_2`, ... to the stem when a name is already taken.
//!
//! Nothing here touches the filesystem, so a dry run and a real run always
//! compute the same plan.

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf, Prefix};
use tracing::debug;

use crate::file_category::{Category, CategoryTable};

/// Folder names that make a meaningful namespace for a file's link.
pub const WELL_KNOWN_LABELS: &[&str] = &[
    "Desktop",
    "Documents",
    "Downloads",
    "Music",
    "Pictures",
    "Photos",
    "Videos",
    "Movies",
];

/// Label used when a file sits directly under a root with no usable name.
const ROOT_LABEL: &str = "root";

/// Case-insensitive set of well-known folder names.
#[derive(Debug, Clone)]
pub struct LabelSet {
    names: HashSet<String>,
}

impl LabelSet {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            names: names
                .iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, name: &OsStr) -> bool {
        self.names.contains(&name.to_string_lossy().to_lowercase())
    }

    /// Derives the source-folder label for `source`.
    ///
    /// Walks up from the file's parent and returns the first ancestor whose
    /// name is well known, spelled as it appears on disk. Otherwise returns
    /// the parent's own name, or the drive letter / `root` for files that
    /// sit directly under a filesystem root.
    pub fn label_for(&self, source: &Path) -> OsString {
        let Some(parent) = source.parent() else {
            return fallback_label(source);
        };

        for ancestor in parent.ancestors() {
            if let Some(name) = ancestor.file_name()
                && self.contains(name)
            {
                return name.to_os_string();
            }
        }

        match parent.file_name() {
            Some(name) => name.to_os_string(),
            None => fallback_label(source),
        }
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::new(WELL_KNOWN_LABELS)
    }
}

fn fallback_label(path: &Path) -> OsString {
    if let Some(Component::Prefix(prefix)) = path.components().next()
        && let Prefix::Disk(letter) | Prefix::VerbatimDisk(letter) = prefix.kind()
    {
        return char::from(letter).to_ascii_uppercase().to_string().into();
    }
    ROOT_LABEL.into()
}

fn serialize_lossy<S: Serializer>(value: &OsString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string_lossy())
}

/// A regular file that belongs to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Absolute path of the original file.
    pub path: PathBuf,
    /// Lowercase extension without the dot.
    pub extension: String,
    pub category: Category,
    /// Source-folder label used to namespace the link, as spelled on disk.
    #[serde(serialize_with = "serialize_lossy")]
    pub label: OsString,
}

/// One planned link: `target` will point at `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkTask {
    pub source: PathBuf,
    /// `<output>/<category>/<label>/<file name>`, possibly disambiguated.
    pub target: PathBuf,
    pub category: Category,
    #[serde(serialize_with = "serialize_lossy")]
    pub label: OsString,
    /// Numeric suffix appended to the stem, if the canonical name was taken.
    pub suffix: Option<u32>,
}

/// Classifies candidates and assigns each a unique target path.
#[derive(Debug, Clone)]
pub struct LinkPlanner {
    output_root: PathBuf,
    table: CategoryTable,
    labels: LabelSet,
    assigned: HashSet<OsString>,
}

impl LinkPlanner {
    pub fn new(output_root: impl Into<PathBuf>, table: CategoryTable, labels: LabelSet) -> Self {
        Self {
            output_root: output_root.into(),
            table,
            labels,
            assigned: HashSet::new(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Classifies `candidate` and derives its label.
    ///
    /// Returns `None` for files whose extension maps to no category; those
    /// are dropped from the plan, not reported as failures.
    pub fn prepare(&self, candidate: PathBuf) -> Option<SourceFile> {
        candidate.file_name()?;
        let category = self.table.classify_path(&candidate)?;
        let extension = candidate
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let label = self.labels.label_for(&candidate);

        Some(SourceFile {
            path: candidate,
            extension,
            category,
            label,
        })
    }

    /// Prepares and assigns a single candidate.
    ///
    /// Suffix order then follows call order, so callers must feed candidates
    /// in a deterministic order. [`LinkPlanner::plan_all`] does that for you.
    pub fn plan(&mut self, candidate: PathBuf) -> Option<LinkTask> {
        let file = self.prepare(candidate)?;
        Some(self.assign(file))
    }

    /// Orders `files` by source path and assigns every target.
    ///
    /// The same file reached through two overlapping roots is planned once.
    pub fn plan_all(&mut self, mut files: Vec<SourceFile>) -> Vec<LinkTask> {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        files.into_iter().map(|file| self.assign(file)).collect()
    }

    /// Assigns the first free target path for `file`.
    pub fn assign(&mut self, file: SourceFile) -> LinkTask {
        let dir = self
            .output_root
            .join(file.category.dir_name())
            .join(&file.label);
        let name = file
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();

        let mut target = dir.join(&name);
        let mut suffix = None;
        let mut counter = 0;
        while !self.assigned.insert(collision_key(&target)) {
            counter += 1;
            target = dir.join(disambiguated_name(Path::new(&name), counter));
            suffix = Some(counter);
        }

        if let Some(n) = suffix {
            debug!(source = %file.path.display(), suffix = n, "disambiguated colliding name");
        }

        LinkTask {
            source: file.path,
            target,
            category: file.category,
            label: file.label,
            suffix,
        }
    }
}

/// `photo.jpg` + 2 -> `photo_2.jpg`; `README` + 1 -> `README_1`.
///
/// Built from `OsStr` pieces so names that are not valid UTF-8 survive intact.
fn disambiguated_name(name: &Path, counter: u32) -> OsString {
    let mut disambiguated = name
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    disambiguated.push(format!("_{counter}"));
    if let Some(ext) = name.extension() {
        disambiguated.push(".");
        disambiguated.push(ext);
    }
    disambiguated
}

/// Key under which a target path is reserved. Case-folded where the
/// platform's filesystems usually are case-insensitive.
fn collision_key(path: &Path) -> OsString {
    if cfg!(any(windows, target_os = "macos")) {
        path.to_string_lossy().to_lowercase().into()
    } else {
        path.as_os_str().to_os_string()
    }
}
