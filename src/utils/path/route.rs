//! Route path handling.
//!
//! A route such as `/about/` is stored on disk as `about/index.html`
//! under the output directory; the root route `/` becomes `index.html`.

use std::path::{Path, PathBuf};

/// File name written for every route.
pub const INDEX_FILE: &str = "index.html";

/// Route with leading and trailing slashes stripped.
///
/// # Examples
/// ```ignore
/// assert_eq!(route_dir("/about/"), "about");
/// assert_eq!(route_dir("/"), "");
/// ```
#[inline]
pub fn route_dir(route: &str) -> &str {
    route.trim_matches('/')
}

/// Output file for a route under `output_dir`.
pub fn page_output_path(output_dir: &Path, route: &str) -> PathBuf {
    let dir = route_dir(route);
    if dir.is_empty() {
        output_dir.join(INDEX_FILE)
    } else {
        output_dir.join(dir).join(INDEX_FILE)
    }
}
