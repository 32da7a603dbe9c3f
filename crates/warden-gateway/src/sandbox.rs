//! Lexical path containment.
//!
//! Paths are resolved against the sandbox root by collapsing `.` and `..`
//! segments without touching the file system, then compared component-wise
//! against the normalized root.
//!
//! Known limitation: this is a textual check only. A symbolic link inside the
//! root that points outside it is not detected. This is not OS-level isolation.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` segments without consulting the file system.
///
/// `..` never climbs above the root or a prefix; `/../etc` normalizes to `/etc`.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if components.last().is_some_and(|c| matches!(c, Component::Normal(_))) {
                    components.pop();
                }
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Make `root` absolute (against the process working directory) and normalize it.
pub fn absolute_root(root: &Path) -> PathBuf {
    if root.is_absolute() {
        return normalize_lexical(root);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize_lexical(&cwd.join(root)),
        Err(_) => normalize_lexical(root),
    }
}

/// Resolve `candidate` against an already-normalized `root`.
///
/// Returns the resolved absolute path when it lies at or below `root`, and
/// `None` when it escapes.
pub fn resolve_within(root: &Path, candidate: &str) -> Option<PathBuf> {
    let resolved = normalize_lexical(&root.join(candidate));
    resolved.starts_with(root).then_some(resolved)
}
