//! Path normalization and logical path helpers.
//!
//! Logical paths are forward-slash-separated relative paths identifying an
//! asset independent of where it physically lives (e.g. `css/app.css`).
//! They never begin with `/`, on any platform.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Join a location and an entry name into a logical path.
///
/// An empty location yields the bare name.
pub fn logical_join(location: &str, name: &str) -> String {
    if location.is_empty() {
        name.to_string()
    } else {
        format!("{location}/{name}")
    }
}

/// Collapse `.` and `..` segments in a forward-slash path.
///
/// `..` segments that would ascend past the root are dropped. Empty
/// segments (from doubled slashes) are removed.
pub fn collapse_dots(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            _ => out.push(seg),
        }
    }
    out.join("/")
}
