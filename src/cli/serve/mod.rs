//! Development file server.
//!
//! Serves the output directory over HTTP while the watcher rebuilds it.
//!
//! ```text
//! FileServer::bind ──▶ start ──▶ [serve thread] incoming_requests
//!                                   └─ rayon scope: one task per request
//!                stop ──▶ unblock accept loop, 503 for stragglers
//!                join ──▶ in-flight requests done, socket released
//! ```

mod listing;
mod path;
mod response;


use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, bail};
use rayon::ThreadPool;
use thiserror::Error;
use tiny_http::{Request, Server};

use crate::config::ServeConfig;
use crate::core::{Joinable, LifecycleState, Service, Startable, StateCell, Stoppable};
use crate::logger::Logger;
use crate::{debug, log};
use path::Resolved;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeOptions {
    pub interface: IpAddr,
    pub port: u16,
    /// Threads answering requests
    pub workers: usize,
}

impl From<&ServeConfig> for ServeOptions {
    fn from(serve: &ServeConfig) -> Self {
        Self {
            interface: serve.interface,
            port: serve.port,
            workers: serve.workers,
        }
    }
}

/// Static file server over a directory.
pub struct FileServer {
    /// `None` once joined, which releases the socket
    server: Option<Arc<Server>>,
    addr: SocketAddr,
    root: PathBuf,
    workers: usize,
    logger: Logger,
    state: StateCell,
    stopping: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FileServer {
    /// Bind the socket. Requests are only answered after [`Startable::start`].
    pub fn bind(options: &ServeOptions, root: &Path, logger: Logger) -> Result<Self, ServeError> {
        let requested = SocketAddr::new(options.interface, options.port);
        let server = Server::http(requested).map_err(|source| ServeError::Bind {
            addr: requested,
            source,
        })?;
        // Port 0 asks the OS for a free port; report the real one
        let addr = server.server_addr().to_ip().unwrap_or(requested);

        Ok(Self {
            server: Some(Arc::new(server)),
            addr,
            root: root.to_path_buf(),
            workers: options.workers.max(1),
            logger,
            state: StateCell::new(),
            stopping: Arc::new(AtomicBool::new(false)),
            handle: None,
        })
    }

    pub fn address(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[cfg(test)]
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Browsable URL: a wildcard interface is reached through `localhost`.
    pub fn url(&self) -> String {
        let host = match self.address() {
            ip if ip.is_unspecified() => "localhost".to_owned(),
            IpAddr::V6(ip) => format!("[{ip}]"),
            IpAddr::V4(ip) => ip.to_string(),
        };
        format!("http://{host}:{}/", self.port())
    }

    fn launch(&self) -> Result<JoinHandle<()>> {
        let server = self
            .server
            .clone()
            .context("file server socket already released")?;
        // +1: the accept loop itself occupies one pool thread
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers + 1)
            .thread_name(|i| format!("serve-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        let root = self.root.clone();
        let stopping = Arc::clone(&self.stopping);
        let logger = self.logger.clone();

        thread::Builder::new()
            .name("file-server".into())
            .spawn(move || run_request_loop(&pool, &server, &root, &stopping, &logger))
            .context("failed to spawn file server thread")
    }
}

impl Startable for FileServer {
    fn start(&mut self) -> Result<()> {
        if !self.state.begin_start() {
            bail!("file server is {}, cannot start", self.state.get().label());
        }

        match self.launch() {
            Ok(handle) => {
                self.handle = Some(handle);
                log!(self.logger; "serve"; "{} (serving {})", self.url(), self.root().display());
                Ok(())
            }
            Err(err) => {
                self.state.finish();
                Err(err)
            }
        }
    }
}

impl Stoppable for FileServer {
    fn stop(&self) {
        if !self.state.begin_stop() {
            return;
        }
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(server) = &self.server {
            server.unblock();
        }
        log!(self.logger; "serve"; "shutting down");
    }
}

impl Joinable for FileServer {
    fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log!(self.logger; "error"; "file server thread panicked");
        }
        // Last reference: dropping it closes the listening socket
        self.server = None;
        if self.state.get() == LifecycleState::Stopping {
            self.state.finish();
            log!(self.logger; "serve"; "stopped");
        }
    }
}

impl Service for FileServer {
    fn name(&self) -> &'static str {
        "file server"
    }
}

/// Accept loop. Returns once the server is unblocked and every request
/// task spawned in the scope has finished.
fn run_request_loop(pool: &ThreadPool, server: &Server, root: &Path, stopping: &AtomicBool, logger: &Logger) {
    pool.scope(|scope| {
        for request in server.incoming_requests() {
            scope.spawn(move |_| {
                if let Err(e) = handle_request(request, root, stopping, logger) {
                    log!(logger; "serve"; "request error: {e:#}");
                }
            });
        }
    });
}

/// Handle a single HTTP request
fn handle_request(request: Request, root: &Path, stopping: &AtomicBool, logger: &Logger) -> Result<()> {
    debug!(logger; "serve"; "{} {}", request.method(), request.url());

    // Early exit if shutdown requested
    if stopping.load(Ordering::SeqCst) {
        return response::respond_unavailable(request);
    }

    if !response::is_allowed_method(request.method()) {
        return response::respond_method_not_allowed(request);
    }

    match path::resolve(request.url(), root) {
        Resolved::File(file) => response::respond_file(request, &file),
        Resolved::Listing(dir) => {
            let display = path::display_path(request.url());
            response::respond_listing(request, &dir, &display)
        }
        Resolved::Redirect(location) => response::respond_redirect(request, &location),
        Resolved::NotFound => response::respond_not_found(request),
    }
}
