//! Error types for symsort.
//!
//! Only [`OrganizeError`] ever stops a run. Per-link problems are
//! [`LinkError`] values that end up as failure records, and traversal
//! problems are [`ScanWarning`](crate::walker::ScanWarning)s.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Conditions that prevent a scan from starting or completing.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// None of the requested scan roots resolved to a readable directory.
    #[error("No valid scan roots supplied")]
    NoScanRoots,

    /// The output root exists but is not a directory.
    #[error("Output path is not a directory: {path}")]
    OutputNotADirectory { path: PathBuf },

    /// The output root could not be created or accessed.
    #[error("Cannot create or access output directory {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The worker pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// An `--exclude` glob did not compile.
    #[error("Invalid exclude pattern '{pattern}'")]
    InvalidPattern { pattern: String },
}

/// Result type for whole-run operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Why a single link could not be created.
///
/// The `Display` text is what gets reported next to the failed path.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Something other than our own link already occupies the target path.
    #[error("target exists, would overwrite")]
    TargetExists,

    #[error("permission denied")]
    PermissionDenied,

    /// The output filesystem cannot hold symbolic links.
    #[error("filesystem does not support symbolic links")]
    Unsupported,

    #[error("{source}")]
    Io {
        #[source]
        source: io::Error,
    },
}

impl LinkError {
    /// Classify an I/O error raised while creating a link or its parent folder.
    pub fn from_io(source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::Unsupported => Self::Unsupported,
            io::ErrorKind::AlreadyExists => Self::TargetExists,
            _ => Self::Io { source },
        }
    }
}
