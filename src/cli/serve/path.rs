//! URL to filesystem path resolution.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode};

use super::listing::HREF;
use crate::utils::path::route::INDEX_FILE;

/// What a request URL maps to under the serve root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Regular file (including a directory's `index.html`)
    File(PathBuf),
    /// Directory without an index page
    Listing(PathBuf),
    /// Directory requested without its trailing slash
    Redirect(String),
    NotFound,
}

/// Resolve a request URL against `serve_root`.
///
/// Query strings and fragments are ignored, the path is percent-decoded,
/// and anything that would escape the root (`..`, symlinks) is rejected.
pub fn resolve(url: &str, serve_root: &Path) -> Resolved {
    let (raw_path, query) = split_url(url);
    let Some(clean) = decode_path(raw_path) else {
        return Resolved::NotFound;
    };

    // Reject paths with suspicious patterns early
    if clean.contains('\\') || clean.split('/').any(|segment| segment == "..") {
        return Resolved::NotFound;
    }

    // Canonicalize to resolve symlinks and verify path is under serve_root
    let (Ok(root), Ok(canonical)) = (
        serve_root.canonicalize(),
        serve_root.join(&*clean).canonicalize(),
    ) else {
        return Resolved::NotFound;
    };
    if !canonical.starts_with(&root) {
        return Resolved::NotFound;
    }

    if canonical.is_dir() {
        if !raw_path.ends_with('/') {
            return Resolved::Redirect(redirect_location(&clean, query));
        }
        let index = canonical.join(INDEX_FILE);
        return if index.is_file() {
            Resolved::File(index)
        } else {
            Resolved::Listing(canonical)
        };
    }

    // `/logo.png/` names a directory that does not exist
    if canonical.is_file() && !raw_path.ends_with('/') {
        return Resolved::File(canonical);
    }

    Resolved::NotFound
}

/// Split `path?query#fragment` into path and query.
fn split_url(url: &str) -> (&str, Option<&str>) {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

/// Percent-decode and trim slashes. `None` for invalid UTF-8.
fn decode_path(path: &str) -> Option<Cow<'_, str>> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    Some(match decoded {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim_matches('/')),
        Cow::Owned(s) => Cow::Owned(s.trim_matches('/').to_owned()),
    })
}

/// Root-relative `Location` for a directory: exactly one leading `/`, so
/// `//host` can never become a protocol-relative redirect.
fn redirect_location(clean: &str, query: Option<&str>) -> String {
    let mut location = String::from("/");
    for segment in clean.split('/').filter(|segment| !segment.is_empty()) {
        location.extend(utf8_percent_encode(segment, HREF));
        location.push('/');
    }
    if let Some(query) = query {
        location.push('?');
        location.push_str(query);
    }
    location
}

/// Decoded URL path for display (listing titles).
pub fn display_path(url: &str) -> String {
    let (raw_path, _) = split_url(url);
    percent_decode_str(raw_path).decode_utf8_lossy().into_owned()
}
