//! Core types - lifecycle contracts and shutdown plumbing shared by the
//! watcher, the file server and the dev supervisor.

mod lifecycle;
mod signal;
mod state;

pub use lifecycle::{Joinable, Service, Startable, Stoppable, join_all, start_all, stop_all};
pub use signal::{ShutdownSignal, install_signal_handler, shutdown_channel};
pub use state::{LifecycleState, StateCell};
