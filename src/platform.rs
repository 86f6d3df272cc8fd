//! Host platform helpers: default scan roots, drive arguments and the
//! symbolic-link capability check.

use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Answers whether this process may create symbolic links.
pub trait LinkPrivilege {
    fn has_link_creation_privilege(&self) -> bool;
}

/// Checks the capability by creating (and removing) a throwaway link in the
/// system temporary directory. Unix systems always allow it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymlinkProbe;

impl LinkPrivilege for SymlinkProbe {
    #[cfg(unix)]
    fn has_link_creation_privilege(&self) -> bool {
        true
    }

    #[cfg(not(unix))]
    fn has_link_creation_privilege(&self) -> bool {
        probe_symlink()
    }
}

#[cfg(not(unix))]
fn probe_symlink() -> bool {
    let dir = std::env::temp_dir();
    let stamp = format!("symsort-probe-{}", std::process::id());
    let source = dir.join(format!("{stamp}.src"));
    let link = dir.join(format!("{stamp}.lnk"));

    if fs::write(&source, b"").is_err() {
        return false;
    }

    #[cfg(windows)]
    let created = std::os::windows::fs::symlink_file(&source, &link);
    #[cfg(not(windows))]
    let created: std::io::Result<()> = Err(std::io::ErrorKind::Unsupported.into());

    let allowed = created.is_ok();
    if let Err(err) = &created {
        debug!(error = %err, "symlink probe failed");
    }
    let _ = fs::remove_file(&link);
    let _ = fs::remove_file(&source);
    allowed
}

/// Returns the roots scanned when none are given.
///
/// On Windows this is every existing drive from `A:\` to `Z:\`. Elsewhere it
/// is the user's home directory, or `/` if `HOME` is unset.
pub fn discover_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
        let drives: Vec<PathBuf> = (b'A'..=b'Z')
            .map(|letter| PathBuf::from(format!("{}:\\", char::from(letter))))
            .filter(|drive| fs::metadata(drive).is_ok())
            .collect();
        debug!(?drives, "discovered drives");
        return drives;
    }

    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => vec![PathBuf::from(home)],
        _ => vec![PathBuf::from("/")],
    }
}

/// Turns a `--drives` argument into a root path.
///
/// On Windows, `C`, `c:` and `C:\` all mean the root of drive C. Any other
/// value is taken as a path.
pub fn normalize_root_arg(arg: &str) -> PathBuf {
    if cfg!(windows) {
        normalize_drive(arg)
    } else {
        PathBuf::from(arg)
    }
}

fn normalize_drive(arg: &str) -> PathBuf {
    let trimmed = arg.trim_end_matches(['\\', '/']);
    let letter = trimmed.strip_suffix(':').unwrap_or(trimmed);
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            PathBuf::from(format!("{}:\\", c.to_ascii_uppercase()))
        }
        _ => PathBuf::from(arg),
    }
}
