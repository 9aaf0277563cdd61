//! Source watcher for the dev loop.
//!
//! ```text
//! notify backend ──▶ events channel ──▶ watch thread
//!                                        ├─ Debouncer (coalesce one batch)
//!                                        └─ Rebuild::rebuild() once per batch
//! ```
//!
//! Rebuilds run on the watch thread itself, so two rebuilds never
//! overlap and `join()` waits for one in progress. A failed rebuild is
//! reported as a watch status and watching continues.

mod debouncer;
mod roots;
mod types;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, bail};
use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use notify::PollWatcher;
use thiserror::Error;

pub use types::{Backend, WatchOptions, WatchTarget};
use types::ChangeSet;

use crate::core::{Joinable, LifecycleState, Service, Startable, StateCell, Stoppable};
use crate::logger::Logger;
use crate::pipeline::Rebuild;
use crate::utils::plural::plural_count;
use crate::{debug, log};
use debouncer::Debouncer;
use roots::WatchRoots;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch `{}`", path.display())]
    Attach {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to create file watcher")]
    Backend(#[from] notify::Error),
}

type NotifyResult = notify::Result<notify::Event>;
type BoxedBackend = Box<dyn notify::Watcher + Send>;

impl Backend {
    fn create(self, tx: Sender<NotifyResult>) -> Result<BoxedBackend, WatchError> {
        let handler = move |res: NotifyResult| {
            let _ = tx.send(res);
        };
        let backend: BoxedBackend = match self {
            Self::Native => Box::new(notify::recommended_watcher(handler)?),
            Self::Poll { interval } => Box::new(PollWatcher::new(
                handler,
                notify::Config::default().with_poll_interval(interval),
            )?),
        };
        Ok(backend)
    }
}

/// Watches the source directories and rebuilds on change.
pub struct Watcher {
    targets: Vec<WatchTarget>,
    options: WatchOptions,
    rebuild: Arc<dyn Rebuild>,
    logger: Logger,
    state: StateCell,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl Watcher {
    pub fn new(
        targets: Vec<WatchTarget>,
        options: WatchOptions,
        rebuild: Arc<dyn Rebuild>,
        logger: Logger,
    ) -> Self {
        let (stop_tx, stop_rx) = channel::bounded(1);
        Self {
            targets,
            options,
            rebuild,
            logger,
            state: StateCell::new(),
            stop_tx,
            stop_rx,
            handle: None,
        }
    }

    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    #[cfg(test)]
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Attach the backend and spawn the watch thread.
    fn launch(&self) -> Result<JoinHandle<()>> {
        let (event_tx, event_rx) = channel::unbounded();
        let mut backend = self.options.backend.create(event_tx)?;

        let mut roots = WatchRoots::new(self.targets.clone());
        roots.attach_all(backend.as_mut())?;

        let worker = WatchLoop {
            backend,
            roots,
            events: event_rx,
            stop: self.stop_rx.clone(),
            debouncer: Debouncer::new(self.options.debounce, self.logger.clone()),
            rebuild: Arc::clone(&self.rebuild),
            logger: self.logger.clone(),
        };

        thread::Builder::new()
            .name("watcher".into())
            .spawn(move || worker.run())
            .context("failed to spawn watcher thread")
    }
}

impl Startable for Watcher {
    fn start(&mut self) -> Result<()> {
        if !self.state.begin_start() {
            bail!("watcher is {}, cannot start", self.state.get().label());
        }

        match self.launch() {
            Ok(handle) => {
                self.handle = Some(handle);
                let dirs: Vec<_> = self
                    .targets()
                    .iter()
                    .map(|t| t.path.display().to_string())
                    .collect();
                log!(self.logger; "watch"; "watching {}", dirs.join(", "));
                Ok(())
            }
            Err(err) => {
                self.state.finish();
                Err(err)
            }
        }
    }
}

impl Stoppable for Watcher {
    fn stop(&self) {
        if self.state.begin_stop() {
            // bounded(1): a full buffer already holds a stop request
            let _ = self.stop_tx.try_send(());
            debug!(self.logger; "watch"; "stop requested");
        }
    }
}

impl Joinable for Watcher {
    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log!(self.logger; "error"; "watcher thread panicked");
            }
            log!(self.logger; "watch"; "stopped watching");
        }
        if self.state.get() == LifecycleState::Stopping {
            self.state.finish();
        }
    }
}

impl Service for Watcher {
    fn name(&self) -> &'static str {
        "watcher"
    }
}

/// State owned by the watch thread.
struct WatchLoop {
    backend: BoxedBackend,
    roots: WatchRoots,
    events: Receiver<NotifyResult>,
    stop: Receiver<()>,
    debouncer: Debouncer,
    rebuild: Arc<dyn Rebuild>,
    logger: Logger,
}

impl WatchLoop {
    fn run(self) {
        let Self {
            mut backend,
            mut roots,
            events,
            stop,
            mut debouncer,
            rebuild,
            logger,
        } = self;

        loop {
            let timeout = debouncer.sleep_duration();
            let mut exit = false;
            select! {
                recv(stop) -> _ => exit = true,
                recv(events) -> msg => match msg {
                    Ok(first) => {
                        accept(&mut debouncer, first, &logger);
                        // drain the rest of the burst before deciding
                        while let Ok(more) = events.try_recv() {
                            accept(&mut debouncer, more, &logger);
                        }
                    }
                    Err(_) => exit = true,
                },
                default(timeout) => roots.maintain(backend.as_mut(), &logger),
            }
            if exit {
                break;
            }

            if let Some(changes) = debouncer.take_if_ready() {
                run_rebuild(rebuild.as_ref(), &changes, &logger);
            }
        }

        // Dropping the backend detaches every OS watch
        drop(backend);
        debug!(logger; "watch"; "watch thread exited");
    }
}

fn accept(debouncer: &mut Debouncer, result: NotifyResult, logger: &Logger) {
    match result {
        Ok(event) => debouncer.add_event(&event),
        Err(e) => log!(logger; "watch"; "notify error: {}", e),
    }
}

fn run_rebuild(rebuild: &dyn Rebuild, changes: &ChangeSet, logger: &Logger) {
    log!(logger; "watch"; "{}, rebuilding", describe_changes(changes));

    match rebuild.rebuild() {
        Ok(report) => logger.status_success(&format!("rebuilt {}", report.summary())),
        Err(err) => logger.status_error("rebuild failed", &format!("{:#}", anyhow::Error::new(err))),
    }
}

/// `modified templates/home.html` for a single change, a count otherwise.
fn describe_changes(changes: &ChangeSet) -> String {
    if changes.len() == 1
        && let Some((path, kind)) = changes.iter().next()
    {
        return format!("{} {}", kind.label(), path.display());
    }
    format!("{} changed", plural_count(changes.len(), "file"))
}
