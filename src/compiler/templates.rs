//! Template directory loading.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use tera::Tera;

use super::RenderError;

/// Build a Tera engine holding every template under `dir`.
///
/// Templates are named by their path relative to `dir` with `/`
/// separators (`partials/nav.html`), which is also how they `extend` and
/// `include` each other. A missing directory yields an empty engine, so
/// the first lookup reports which template was wanted.
pub fn load_templates(dir: &Path) -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    // Pages are trusted source; escaping would mangle route paths (`/` → `&#x2F;`)
    tera.autoescape_on(vec![]);

    if !dir.is_dir() {
        return Ok(tera);
    }

    let files = collect_templates(dir);
    tera.add_template_files(files)
        .map_err(|source| RenderError::Load {
            dir: dir.to_path_buf(),
            source,
        })?;
    Ok(tera)
}

/// Template files with their names, sorted for a stable load order.
/// Hidden files (editor swap files, `.DS_Store`) are skipped.
fn collect_templates(dir: &Path) -> Vec<(PathBuf, Option<String>)> {
    WalkDir::new(dir)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let path = e.path();
            let name = template_name(dir, &path)?;
            Some((path, Some(name)))
        })
        .collect()
}

fn template_name(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
