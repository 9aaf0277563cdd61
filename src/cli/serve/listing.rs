//! HTML listing for directories without an `index.html`.

use std::fs;
use std::io;
use std::path::Path;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::utils::html::escape;

/// Characters left as-is in one path segment of an href or `Location`.
pub(super) const HREF: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Render the entries of `dir`; `display_path` is the decoded request path.
///
/// Entries are sorted case-insensitively, subdirectories get a trailing `/`.
pub fn render_listing(dir: &Path, display_path: &str) -> io::Result<String> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.path().is_dir();
        entries.push((name, is_dir));
    }
    entries.sort_by_cached_key(|(name, _)| name.to_lowercase());

    let title = format!("Directory listing for {}", escape(display_path));
    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for (name, is_dir) in &entries {
        let slash = if *is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<li><a href=\"{}{slash}\">{}{slash}</a></li>\n",
            utf8_percent_encode(name, HREF),
            escape(name),
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}
