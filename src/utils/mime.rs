//! Content-Type lookup for served files.

use std::path::Path;

pub const HTML: &str = "text/html; charset=utf-8";
pub const PLAIN: &str = "text/plain; charset=utf-8";
const FALLBACK: &str = "application/octet-stream";

/// Extensions (lowercase) and the Content-Type they are served with.
const CONTENT_TYPES: &[(&[&str], &str)] = &[
    (&["html", "htm"], HTML),
    (&["txt"], PLAIN),
    (&["css"], "text/css; charset=utf-8"),
    (&["js", "mjs"], "text/javascript; charset=utf-8"),
    (&["json", "map", "webmanifest"], "application/json"),
    (&["xml"], "application/xml"),
    (&["pdf"], "application/pdf"),
    (&["wasm"], "application/wasm"),
    (&["png"], "image/png"),
    (&["jpg", "jpeg"], "image/jpeg"),
    (&["gif"], "image/gif"),
    (&["webp"], "image/webp"),
    (&["avif"], "image/avif"),
    (&["svg"], "image/svg+xml"),
    (&["ico"], "image/x-icon"),
    (&["mp4", "m4v"], "video/mp4"),
    (&["webm"], "video/webm"),
    (&["mp3"], "audio/mpeg"),
    (&["woff"], "font/woff"),
    (&["woff2"], "font/woff2"),
    (&["ttf"], "font/ttf"),
    (&["otf"], "font/otf"),
];

/// Content-Type for `path`, by extension (case-insensitive).
pub fn from_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return FALLBACK;
    };
    CONTENT_TYPES
        .iter()
        .find(|(exts, _)| exts.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .map_or(FALLBACK, |&(_, content_type)| content_type)
}
