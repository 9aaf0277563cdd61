//! Merge-copy of the static asset tree.
//!
//! Files under the same relative path are overwritten; files that only
//! exist in the destination are left alone. Nothing is ever deleted.

use std::fs;
use std::path::Path;

use super::CopyError;
use crate::utils::write::copy_atomic;

/// Name of the asset directory inside the output directory.
pub const STATIC_DIR: &str = "static";

/// OS/editor droppings never worth publishing.
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub files: usize,
    pub bytes: u64,
}

/// Copy `static_dir` into `output_dir/static`.
pub fn copy(static_dir: &Path, output_dir: &Path) -> Result<CopyReport, CopyError> {
    if !static_dir.is_dir() {
        return Err(CopyError::SourceNotFound(static_dir.to_path_buf()));
    }

    let mut report = CopyReport::default();
    copy_dir_recursive(static_dir, &output_dir.join(STATIC_DIR), &mut report)?;
    Ok(report)
}

fn copy_dir_recursive(src_dir: &Path, dest_dir: &Path, report: &mut CopyReport) -> Result<(), CopyError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| CopyError::Io { path, source }
    };

    fs::create_dir_all(dest_dir).map_err(io_err(dest_dir))?;

    let mut entries = fs::read_dir(src_dir)
        .map_err(io_err(src_dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err(src_dir))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let file_name = entry.file_name();
        if file_name.to_str().is_some_and(|name| IGNORED_FILES.contains(&name)) {
            continue;
        }

        let src_path = entry.path();
        let dest_path = dest_dir.join(&file_name);

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path, report)?;
        } else {
            report.bytes += copy_atomic(&src_path, &dest_path).map_err(io_err(&src_path))?;
            report.files += 1;
        }
    }

    Ok(())
}
