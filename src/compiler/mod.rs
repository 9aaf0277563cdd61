//! Page rendering: route table + template directory → HTML files.
//!
//! # Module Structure
//!
//! ```text
//! compiler/
//! ├── templates   # Template directory → Tera engine
//! └── render      # Per-route rendering and output writes
//! ```
//!
//! One engine instance is built per render pass, so every pass sees the
//! template directory exactly as it is on disk at that moment.

mod render;
mod templates;


use std::path::PathBuf;

use thiserror::Error;

pub use render::render;
pub use templates::load_templates;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template `{name}` not found in `{}`", dir.display())]
    TemplateNotFound { name: String, dir: PathBuf },

    #[error("failed to load templates from `{}`", dir.display())]
    Load {
        dir: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("failed to render template `{name}`")]
    Template {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("failed to write `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
