//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! templates = "templates"   # Page templates, looked up by route table name
//! static = "static"         # Copied to <output>/static
//! output = "dist"           # Generated site
//! ```
//!
//! Relative paths are resolved against the directory holding `site.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::path::resolve_path;

/// Build paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Template directory.
    pub templates: PathBuf,

    /// Static asset directory.
    #[serde(rename = "static")]
    pub static_dir: PathBuf,

    /// Output directory.
    pub output: PathBuf,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            templates: "templates".into(),
            static_dir: "static".into(),
            output: "dist".into(),
        }
    }
}

impl BuildSectionConfig {
    /// Anchor every relative path at `root`.
    pub fn normalize_paths(&mut self, root: &Path) {
        self.templates = resolve_path(&self.templates, root);
        self.static_dir = resolve_path(&self.static_dir, root);
        self.output = resolve_path(&self.output, root);
    }

    /// Reject empty paths (`templates = ""` would resolve to the site root).
    pub fn validate(&self) -> Result<(), String> {
        for (field, path) in [
            ("build.templates", &self.templates),
            ("build.static", &self.static_dir),
            ("build.output", &self.output),
        ] {
            if path.as_os_str().is_empty() {
                return Err(format!("`{field}` must not be empty"));
            }
        }
        if self.output == self.templates || self.output == self.static_dir {
            return Err("`build.output` must differ from the source directories".into());
        }
        Ok(())
    }
}
