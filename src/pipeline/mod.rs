//! Rebuild pipeline: one "regenerate the site" unit.
//!
//! ```text
//! ensure output dir ──▶ render pages ──▶ copy static assets
//! ```
//!
//! Fail-fast: when rendering fails, assets are not copied. The same
//! pipeline runs for the cold build and for every watcher-triggered
//! rebuild.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::asset::{self, CopyError};
use crate::compiler::{self, RenderError};
use crate::config::SitePaths;
use crate::debug;
use crate::logger::Logger;
use crate::page::RouteTable;
use crate::utils::plural::plural_count;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to create output directory `{}`", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Copy(#[from] CopyError),
}

/// Outcome of a successful rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages_written: usize,
    pub pages_unchanged: usize,
    pub assets: usize,
    pub elapsed: Duration,
}

impl BuildReport {
    /// One-line summary, e.g. `3 pages (1 unchanged), 4 assets in 12ms`.
    pub fn summary(&self) -> String {
        let pages = plural_count(self.pages_written + self.pages_unchanged, "page");
        let unchanged = if self.pages_unchanged > 0 {
            format!(" ({} unchanged)", self.pages_unchanged)
        } else {
            String::new()
        };
        format!(
            "{pages}{unchanged}, {} in {}ms",
            plural_count(self.assets, "asset"),
            self.elapsed.as_millis()
        )
    }
}

/// Anything that can regenerate the site.
///
/// The watcher only knows this trait, so tests can count or fail rebuilds
/// without touching templates.
pub trait Rebuild: Send + Sync {
    fn rebuild(&self) -> Result<BuildReport, BuildError>;
}

/// Renderer followed by the asset copier.
#[derive(Debug)]
pub struct RebuildPipeline {
    paths: SitePaths,
    routes: RouteTable,
    logger: Logger,
}

impl RebuildPipeline {
    pub fn new(paths: SitePaths, routes: RouteTable, logger: Logger) -> Self {
        Self {
            paths,
            routes,
            logger,
        }
    }
}

impl Rebuild for RebuildPipeline {
    fn rebuild(&self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let output = &self.paths.output;

        fs::create_dir_all(output).map_err(|source| BuildError::OutputDir {
            path: output.clone(),
            source,
        })?;

        let pages = compiler::render(&self.paths.templates, &self.routes, output)?;
        debug!(self.logger; "render"; "{} written, {} unchanged", pages.written, pages.unchanged);

        let assets = asset::copy(&self.paths.static_dir, output)?;
        debug!(self.logger; "asset"; "{} ({} bytes)", plural_count(assets.files, "file"), assets.bytes);

        Ok(BuildReport {
            pages_written: pages.written,
            pages_unchanged: pages.unchanged,
            assets: assets.files,
            elapsed: started.elapsed(),
        })
    }
}
