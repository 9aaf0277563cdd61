use std::path::PathBuf;

use rustc_hash::FxHashSet;

use super::WatchError;
use super::types::WatchTarget;
use crate::debug;
use crate::logger::Logger;

/// Watch-root consistency manager.
///
/// - attach every target at startup (a missing target is an error)
/// - re-attach targets that were removed and recreated while running
pub(super) struct WatchRoots {
    desired: Vec<WatchTarget>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(targets: Vec<WatchTarget>) -> Self {
        Self {
            desired: targets,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_all(&mut self, backend: &mut dyn notify::Watcher) -> Result<(), WatchError> {
        for target in &self.desired {
            backend
                .watch(&target.path, target.mode())
                .map_err(|source| WatchError::Attach {
                    path: target.path.clone(),
                    source,
                })?;
            self.attached.insert(target.path.clone());
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, backend: &mut dyn notify::Watcher, logger: &Logger) {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        for target in &self.desired {
            if self.attached.contains(&target.path) || !target.path.exists() {
                continue;
            }

            if backend.watch(&target.path, target.mode()).is_ok() {
                self.attached.insert(target.path.clone());
                debug!(logger; "watch"; "re-attached watch: {}", target.path.display());
            }
        }
    }
}
