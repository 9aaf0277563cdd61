//! Path helpers shared by config, the watcher and the server.

pub mod route;

use std::path::{Path, PathBuf};

pub use route::page_output_path;

/// Absolute form of `path`, with symlinks resolved when it exists.
///
/// Paths that cannot be canonicalized (not created yet) are anchored at
/// the current directory instead. Watch events report canonical paths,
/// so roots must be compared in this form.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match std::env::current_dir() {
        Ok(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    }
}

/// `path` anchored at `base` unless already absolute. Never touches the
/// file system.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
}
