use std::path::Path;
use std::time::{Duration, Instant};

use notify::event::{MetadataKind, ModifyKind};
use notify::EventKind;

use super::types::{ChangeKind, ChangeSet};
use crate::debug;
use crate::logger::Logger;
use crate::utils::path::normalize_path;

/// Wake-up interval while no batch is pending (root maintenance).
pub(super) const IDLE_TICK: Duration = Duration::from_secs(1);

/// Pure debouncer: only handles timing and event deduplication.
///
/// The first accepted event of a batch arms the window; later events are
/// absorbed into the same batch without extending it, so a steady stream
/// of writes still rebuilds once per window.
pub(super) struct Debouncer {
    window: Duration,
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: ChangeSet,
    pub(super) armed_at: Option<Instant>,
    logger: Logger,
}

impl Debouncer {
    pub(super) fn new(window: Duration, logger: Logger) -> Self {
        Self {
            window,
            changes: ChangeSet::default(),
            armed_at: None,
            logger,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify/Rename → Modify (file existed before the
    ///   batch, so a later Remove is still a deletion)
    /// - Modify/Rename + Remove → Remove (file was deleted)
    /// - Create + Remove → dropped (never existed as far as the build cares)
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let Some(kind) = classify(&event.kind) else {
            return;
        };

        debug!(self.logger; "watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }

            let path = normalize_path(path);

            if let Some(&existing) = self.changes.get(&path) {
                match (existing, kind) {
                    (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified | ChangeKind::Renamed) => {
                        debug!(self.logger; "watch"; "restore removed->modified: {}", path.display());
                        self.changes.insert(path, ChangeKind::Modified);
                    }
                    (ChangeKind::Modified | ChangeKind::Renamed, ChangeKind::Removed) => {
                        debug!(self.logger; "watch"; "upgrade {}->removed: {}", existing.label(), path.display());
                        self.changes.insert(path, ChangeKind::Removed);
                    }
                    (ChangeKind::Created, ChangeKind::Removed) => {
                        debug!(self.logger; "watch"; "discard created+removed: {}", path.display());
                        self.changes.remove(&path);
                    }
                    _ => {}
                }
            } else {
                debug!(self.logger; "watch"; "event {}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }

            self.armed_at.get_or_insert_with(Instant::now);
        }
    }

    /// Take the batch once the window has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<ChangeSet> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.armed_at = None;

        if changes.is_empty() {
            return None;
        }
        Some(changes)
    }

    pub(super) fn is_ready(&self) -> bool {
        self.armed_at
            .is_some_and(|armed_at| armed_at.elapsed() >= self.window)
    }

    /// How long the event loop may block before the batch is due.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(armed_at) = self.armed_at else {
            return IDLE_TICK;
        };

        self.window
            .saturating_sub(armed_at.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Map a notify event kind to a change, or `None` for noise.
fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        // The poll backend reports content changes as a new write time.
        // Any other metadata change (atime, chmod, xattr) is noise that
        // could even loop with our own writes.
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)) => {
            Some(ChangeKind::Modified)
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        // emacs lock files, vim's write probe
        || name.starts_with(".#")
        || name == "4913"
        || name == ".DS_Store"
}
