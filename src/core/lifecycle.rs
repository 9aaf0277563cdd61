//! Start/stop/join contracts for the dev-mode services.
//!
//! The watcher and the file server both run on their own thread and
//! implement the same three capabilities, so the supervisor can sequence
//! them generically.

use anyhow::Result;

/// Launch the service's background work without blocking the caller.
pub trait Startable {
    fn start(&mut self) -> Result<()>;
}

/// Ask the service to wind down. Must be idempotent and must not block
/// on the service's thread.
pub trait Stoppable {
    fn stop(&self);
}

/// Block until the service's background work has fully ceased.
pub trait Joinable {
    fn join(&mut self);
}

/// A named service the supervisor can start, stop and join.
pub trait Service: Startable + Stoppable + Joinable + Send {
    fn name(&self) -> &'static str;
}

/// Start services in order.
///
/// If one fails, the already-started ones are stopped and joined in
/// reverse order before the error is returned.
pub fn start_all(services: &mut [Box<dyn Service>]) -> Result<()> {
    for index in 0..services.len() {
        if let Err(err) = services[index].start() {
            let started = &mut services[..index];
            for service in started.iter().rev() {
                service.stop();
            }
            for service in started.iter_mut().rev() {
                service.join();
            }
            return Err(err.context(format!("failed to start {}", services[index].name())));
        }
    }
    Ok(())
}

/// Stop services in order.
pub fn stop_all(services: &[Box<dyn Service>]) {
    for service in services {
        service.stop();
    }
}

/// Join services in order.
pub fn join_all(services: &mut [Box<dyn Service>]) {
    for service in services {
        service.join();
    }
}
