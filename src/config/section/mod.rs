//! Configuration section definitions.
//!
//! Each module corresponds to a section in `site.toml`:
//!
//! | Module  | TOML Section | Purpose                                 |
//! |---------|--------------|-----------------------------------------|
//! | `build` | `[build]`    | Source and output directories           |
//! | `serve` | `[serve]`    | Dev server and watcher settings         |
//!
//! `[routes]` is a plain table and lives on `SiteConfig` directly.

mod build;
mod serve;

pub use build::BuildSectionConfig;
pub use serve::ServeConfig;
