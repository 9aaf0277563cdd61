//! Dev mode: cold build, then watch and serve until shutdown.
//!
//! ```text
//! cold build ─▶ bind ─▶ start watcher ─▶ start server ─▶ wait
//!                                                          │ shutdown
//!              join watcher, server ◀─ stop watcher, server ◀┘
//! ```
//!
//! The cold build and the bind both happen before any service starts, so a
//! broken site or an occupied port exits without leaving threads behind.


use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;

use crate::cli::serve::{FileServer, ServeOptions};
use crate::config::ServeConfig;
use crate::core::{
    Service, ShutdownSignal, StateCell, join_all, start_all, stop_all,
};
use crate::log;
use crate::logger::Logger;
use crate::pipeline::Rebuild;
use crate::watch::{WatchOptions, WatchTarget, Watcher};

/// Settings for both dev services.
#[derive(Debug, Clone, Copy)]
pub struct DevOptions {
    pub watch: WatchOptions,
    pub serve: ServeOptions,
}

impl From<&ServeConfig> for DevOptions {
    fn from(serve: &ServeConfig) -> Self {
        Self {
            watch: WatchOptions::from(serve),
            serve: ServeOptions::from(serve),
        }
    }
}

/// Owns the watcher and the file server for one dev session.
pub struct DevSupervisor {
    logger: Logger,
    state: StateCell,
    /// Address the server listens on while it runs
    bound: Mutex<Option<SocketAddr>>,
}

impl DevSupervisor {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            state: StateCell::new(),
            bound: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> crate::core::LifecycleState {
        self.state.get()
    }

    /// The server's real address, once bound and until it is joined.
    #[cfg(test)]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.lock()
    }

    /// Run one dev session. Blocks until `shutdown` fires and every service
    /// has been joined.
    pub fn run(
        &self,
        pipeline: Arc<dyn Rebuild>,
        targets: Vec<WatchTarget>,
        output_dir: &Path,
        options: &DevOptions,
        shutdown: ShutdownSignal,
    ) -> Result<()> {
        if !self.state.begin_start() {
            bail!("dev session already {}", self.state.get().label());
        }
        let result = self.session(pipeline, targets, output_dir, options, &shutdown);
        *self.bound.lock() = None;
        self.state.finish();
        result
    }

    fn session(
        &self,
        pipeline: Arc<dyn Rebuild>,
        targets: Vec<WatchTarget>,
        output_dir: &Path,
        options: &DevOptions,
        shutdown: &ShutdownSignal,
    ) -> Result<()> {
        let report = pipeline.rebuild().context("cold build failed")?;
        self.logger.status_success(&format!("built {}", report.summary()));

        let watcher = Watcher::new(targets, options.watch, pipeline, self.logger.clone());
        let server = FileServer::bind(&options.serve, output_dir, self.logger.clone())?;
        *self.bound.lock() = Some(server.local_addr());

        let mut services: Vec<Box<dyn Service>> = vec![Box::new(watcher), Box::new(server)];
        start_all(&mut services)?;
        // Armed before announcing readiness: from here a signal is graceful
        shutdown.arm();
        log!(self.logger; "dev"; "ready, press Ctrl+C to stop");
        shutdown.wait();

        self.state.begin_stop();
        log!(self.logger; "dev"; "shutting down");
        stop_all(&services);
        join_all(&mut services);
        log!(self.logger; "dev"; "stopped");
        Ok(())
    }
}
