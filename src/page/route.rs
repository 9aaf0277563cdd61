//! Route table - URL path to template mapping.
//!
//! ```text
//! /           -> home.html       -> dist/index.html
//! /portfolio  -> portfolio.html  -> dist/portfolio/index.html
//! /about      -> about.html      -> dist/about/index.html
//! ```
//!
//! The table is validated once at startup and never changes afterwards.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::utils::path::{page_output_path, route::route_dir};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route `{0}` must start with `/`")]
    MissingLeadingSlash(String),

    #[error("route `{0}` must not contain `..` or `\\`")]
    Unsafe(String),

    #[error("route `{0}` has an empty template name")]
    EmptyTemplate(String),

    #[error("routes `{first}` and `{second}` write the same page")]
    Collision { first: String, second: String },
}

/// One page: where it is served and which template renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoute {
    /// URL path as configured (e.g. `/about`)
    pub path: String,
    /// Template name relative to the template directory
    pub template: String,
}

impl PageRoute {
    /// Output HTML file for this route.
    pub fn output_file(&self, output_dir: &Path) -> PathBuf {
        page_output_path(output_dir, &self.path)
    }
}

/// Ordered, collision-free set of routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<PageRoute>,
}

impl RouteTable {
    /// Build a table, keeping the given order.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, RouteError> {
        let mut routes = Vec::new();
        // output dir -> first route claiming it
        let mut claimed: FxHashMap<String, String> = FxHashMap::default();

        for (path, template) in entries {
            if !path.starts_with('/') {
                return Err(RouteError::MissingLeadingSlash(path.to_owned()));
            }
            if path.contains('\\') || path.split('/').any(|segment| segment == "..") {
                return Err(RouteError::Unsafe(path.to_owned()));
            }
            if template.trim().is_empty() {
                return Err(RouteError::EmptyTemplate(path.to_owned()));
            }

            if let Some(first) = claimed.insert(route_dir(path).to_owned(), path.to_owned()) {
                return Err(RouteError::Collision {
                    first,
                    second: path.to_owned(),
                });
            }

            routes.push(PageRoute {
                path: path.to_owned(),
                template: template.to_owned(),
            });
        }

        Ok(Self { routes })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageRoute> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
