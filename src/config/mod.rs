//! Site configuration management for `site.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   └── serve      # [serve]
//! ├── error          # ConfigError
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! The config file is optional: without one every value takes its default
//! and the project root is the working directory.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{BuildSectionConfig, ServeConfig};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::logger::Logger;
use crate::page::RouteTable;
use crate::utils::path::resolve_path;
use crate::watch::WatchTarget;
use crate::log;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "site.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing site.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file, if one was loaded (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build paths
    #[serde(default)]
    pub build: BuildSectionConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// URL path → template name
    #[serde(default = "default_routes")]
    pub routes: BTreeMap<String, String>,
}

/// Pages of a fresh site.
pub fn default_routes() -> BTreeMap<String, String> {
    [
        ("/", "home.html"),
        ("/portfolio", "portfolio.html"),
        ("/about", "about.html"),
    ]
    .into_iter()
    .map(|(route, template)| (route.to_owned(), template.to_owned()))
    .collect()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            root: PathBuf::new(),
            build: BuildSectionConfig::default(),
            serve: ServeConfig::default(),
            routes: default_routes(),
        }
    }
}

/// Absolute directories one build works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub templates: PathBuf,
    pub static_dir: PathBuf,
    pub output: PathBuf,
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// An explicit `--config` must exist; the default `site.toml` is
    /// optional. The project root is the config file's parent directory.
    pub fn load(cli: &Cli, logger: &Logger) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match &cli.config {
            Some(path) => {
                let path = resolve_path(path, &cwd);
                if !path.is_file() {
                    return Err(ConfigError::Io(
                        path,
                        std::io::Error::from(std::io::ErrorKind::NotFound),
                    )
                    .into());
                }
                Some(path)
            }
            None => Some(cwd.join(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
        };

        let mut config = match &config_path {
            Some(path) => Self::from_path(path, logger)?,
            None => Self::default(),
        };

        let root = config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.clone(), Path::to_path_buf);

        config.config_path = config_path;
        config.finalize(&root);
        config.apply_cli(cli, &cwd);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path, logger: &Logger) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path, logger);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path, logger: &Logger) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!(logger; "warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Set the root and anchor relative paths at it.
    fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        self.build.normalize_paths(root);
    }

    /// CLI flags override file values. `--output` is relative to the
    /// working directory, not to the config file.
    fn apply_cli(&mut self, cli: &Cli, cwd: &Path) {
        if let Some(output) = &cli.output {
            self.build.output = resolve_path(output, cwd);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build.validate().map_err(ConfigError::Validation)?;
        self.serve.validate().map_err(ConfigError::Validation)?;
        self.route_table()?;
        Ok(())
    }

    /// Validated route table built from `[routes]`.
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        Ok(RouteTable::new(
            self.routes.iter().map(|(route, template)| (route.as_str(), template.as_str())),
        )?)
    }

    pub fn paths(&self) -> SitePaths {
        SitePaths {
            templates: self.build.templates.clone(),
            static_dir: self.build.static_dir.clone(),
            output: self.build.output.clone(),
        }
    }

    /// Directories the dev loop watches: templates and static assets.
    pub fn watch_targets(&self) -> Vec<WatchTarget> {
        vec![
            WatchTarget::recursive(&self.build.templates),
            WatchTarget::recursive(&self.build.static_dir),
        ]
    }
}

// ============================================================================
// test helpers
// ============================================================================

/// Parse config from a TOML string for tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    toml::from_str(content).expect("test config should parse")
}
