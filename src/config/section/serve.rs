//! `[serve]` section configuration.
//!
//! Settings for `--dev`: the HTTP server and the source watcher.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "0.0.0.0"     # Network interface (0.0.0.0 = all interfaces)
//! port = 8000               # HTTP port number
//! workers = 4               # Request worker threads
//! debounce_ms = 100         # Quiet window before a rebuild
//! poll = false              # Poll the file system instead of OS events
//! poll_interval_ms = 250    # Poll interval when `poll = true`
//! ```
//!
//! Use `interface = "127.0.0.1"` to keep the server local.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Development server and watcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number. `0` picks a free port.
    pub port: u16,

    /// Threads answering requests.
    pub workers: usize,

    /// Coalescing window for change events, in milliseconds.
    /// `0` rebuilds once per drained batch of events.
    pub debounce_ms: u64,

    /// Use the polling backend instead of OS notifications.
    pub poll: bool,

    /// Poll interval in milliseconds (only with `poll = true`).
    pub poll_interval_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            workers: 4,
            debounce_ms: 100,
            poll: false,
            poll_interval_ms: 250,
        }
    }
}

impl ServeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("`serve.workers` must be at least 1".into());
        }
        if !(1..1000).contains(&self.poll_interval_ms) {
            return Err(format!(
                "`serve.poll_interval_ms` must be between 1 and 999, got {}",
                self.poll_interval_ms
            ));
        }
        Ok(())
    }
}
