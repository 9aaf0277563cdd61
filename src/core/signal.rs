//! Termination signal handling.
//!
//! The OS handler never runs shutdown logic itself: it only forwards a
//! message on the control channel that the supervisor blocks on. The stop
//! and join sequence then runs on the control thread.
//!
//! - first signal while dev mode is running: graceful shutdown request
//! - any further signal, or a signal before dev mode is ready: the process
//!   exits immediately, so a stalled shutdown can never hang it

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::Result;
use crossbeam::channel::{self, Receiver, Sender};

/// Exit status used when a signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// What the OS handler does with a delivered signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Forward a shutdown request to the supervisor.
    Shutdown,
    /// Exit right away.
    ForceExit,
}

impl SignalAction {
    /// Decide based on how many signals arrived before this one and on
    /// whether graceful shutdown is currently possible.
    pub fn for_delivery(previous: usize, armed: bool) -> Self {
        if armed && previous == 0 {
            Self::Shutdown
        } else {
            Self::ForceExit
        }
    }
}

/// Requests a graceful shutdown. Cloneable; safe from any thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Sender<()>,
    armed: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Request shutdown. Repeated requests are harmless.
    pub fn request(&self) {
        let _ = self.tx.send(());
    }

    fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

/// Receiving side, owned by the supervisor's control thread.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
    armed: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Allow OS signals to request a graceful shutdown from now on.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Block until a shutdown was requested.
    pub fn wait(&self) {
        // A disconnected channel means every handle is gone: nothing can
        // request shutdown anymore, so treat it as a request.
        let _ = self.rx.recv();
    }
}

/// Create a connected shutdown handle/signal pair.
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = channel::unbounded();
    let armed = Arc::new(AtomicBool::new(false));
    (
        ShutdownHandle {
            tx,
            armed: Arc::clone(&armed),
        },
        ShutdownSignal { rx, armed },
    )
}

/// Install the process-wide interrupt/terminate handler. Call once at
/// program start.
pub fn install_signal_handler(handle: ShutdownHandle) -> Result<()> {
    let delivered = AtomicUsize::new(0);
    ctrlc::set_handler(move || {
        let previous = delivered.fetch_add(1, Ordering::SeqCst);
        match SignalAction::for_delivery(previous, handle.is_armed()) {
            SignalAction::Shutdown => handle.request(),
            SignalAction::ForceExit => std::process::exit(FORCED_EXIT_CODE),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set signal handler: {}", e))
}
