//! Counts in log summaries.

/// `plural_count(3, "page")` -> `"3 pages"`, `plural_count(1, "asset")` -> `"1 asset"`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
