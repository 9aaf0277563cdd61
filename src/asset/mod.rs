//! Static asset copying: `static/` → `<output>/static/`.

mod copy;

use std::path::PathBuf;

use thiserror::Error;

pub use copy::copy;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("static directory `{}` not found", .0.display())]
    SourceNotFound(PathBuf),

    #[error("failed to copy `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
