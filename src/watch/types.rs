use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use rustc_hash::FxHashMap;

use crate::config::ServeConfig;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Renamed,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
            Self::Removed => "removed",
        }
    }
}

/// Coalesced changes of one batch, one entry per path.
pub type ChangeSet = FxHashMap<PathBuf, ChangeKind>;

/// A directory the watcher monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub recursive: bool,
}

impl WatchTarget {
    pub fn recursive(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            recursive: true,
        }
    }

    pub(super) fn mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }
}

/// Where change notifications come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// inotify / FSEvents / ReadDirectoryChangesW
    Native,
    /// Periodic rescans, for file systems without change notifications
    Poll { interval: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Coalescing window, armed by the first event of a batch
    pub debounce: Duration,
    pub backend: Backend,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::from(&ServeConfig::default())
    }
}

impl From<&ServeConfig> for WatchOptions {
    fn from(serve: &ServeConfig) -> Self {
        let backend = if serve.poll {
            Backend::Poll {
                interval: serve.poll_interval(),
            }
        } else {
            Backend::Native
        };
        Self {
            debounce: serve.debounce(),
            backend,
        }
    }
}
