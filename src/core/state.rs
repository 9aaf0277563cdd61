//! Lifecycle state shared by every long-running service.
//!
//! ```text
//! Idle ──start──▶ Running ──stop──▶ Stopping ──join──▶ Stopped
//!   └───────────────stop (never started)──────────────▶ Stopped
//! ```
//!
//! Transitions are compare-and-swap, so a second `stop()` (duplicate
//! signal) or a `join()` without `start()` is a no-op instead of a hang.

use std::sync::atomic::{AtomicU8, Ordering};

/// Where a service is in its start/stop/join protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

/// Atomic holder for a [`LifecycleState`].
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    pub const fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Idle as u8))
    }

    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `Idle → Running`. Returns false if the service was already started.
    pub fn begin_start(&self) -> bool {
        self.transition(LifecycleState::Idle, LifecycleState::Running)
    }

    /// `Running → Stopping`, or `Idle → Stopped` for a service that never ran.
    ///
    /// Returns true only for the call that actually initiated the stop.
    pub fn begin_stop(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Stopping)
            || self.transition(LifecycleState::Idle, LifecycleState::Stopped)
    }

    /// Mark the service as fully stopped (after its thread was joined).
    pub fn finish(&self) {
        self.0.store(LifecycleState::Stopped as u8, Ordering::Release);
    }
}
