//! Atomic file output.
//!
//! Every page and asset lands through a temporary sibling that is renamed
//! over the target, so a concurrent reader (the dev server) sees either
//! the old file or the new one, never a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Result of [`write_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `bytes` to `path` atomically, creating parent directories.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = temp_sibling(path)?;
    tmp.write_all(bytes)?;
    // NamedTempFile is created 0600; published pages should be world-readable
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Like [`write_atomic`], but leaves the file alone when its content is
/// already `bytes`.
pub fn write_if_changed(path: &Path, bytes: &[u8]) -> io::Result<WriteOutcome> {
    if let Ok(existing) = fs::read(path)
        && existing == bytes
    {
        return Ok(WriteOutcome::Unchanged);
    }
    write_atomic(path, bytes)?;
    Ok(WriteOutcome::Written)
}

/// Copy `src` to `dest` atomically. Permissions follow `src`.
pub fn copy_atomic(src: &Path, dest: &Path) -> io::Result<u64> {
    let tmp = temp_sibling(dest)?;
    let copied = fs::copy(src, tmp.path())?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(copied)
}

fn temp_sibling(path: &Path) -> io::Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    NamedTempFile::new_in(parent)
}
