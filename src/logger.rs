//! Logging utilities with colored output and watch-mode status display.
//!
//! This module provides:
//! - [`Logger`], a cheap cloneable handle handed to every component
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, only printed when verbose output is enabled
//! - single-block watch status (`✓` / `✗`) that overwrites itself
//!
//! There is no process-wide logger: whoever needs to log receives a
//! `Logger` in its constructor.
//!
//! # Example
//!
//! ```ignore
//! let logger = Logger::stdout(false);
//! log!(logger; "build"; "rendered {} pages", count);
//! logger.status_success("rebuilt site");
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write, stdout},
    sync::Arc,
};

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!(logger; "module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr; $module:expr; $($arg:tt)*) => {{
        $logger.log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!(logger; "module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr; $module:expr; $($arg:tt)*) => {{
        if $logger.is_verbose() {
            $logger.log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Logger
// ============================================================================

/// Where log lines end up.
enum Sink {
    /// Colored terminal output.
    Stdout,
    /// Plain lines kept in memory (tests).
    #[cfg(test)]
    Capture(Mutex<Vec<String>>),
}

struct Inner {
    verbose: bool,
    sink: Sink,
    /// Lines of the previous status block, cleared by the next one
    status_lines: Mutex<usize>,
}

/// Logging handle shared by all components.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("verbose", &self.inner.verbose)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Logger writing colored lines to stdout.
    pub fn stdout(verbose: bool) -> Self {
        Self::with_sink(verbose, Sink::Stdout)
    }

    /// Logger keeping plain lines in memory, readable via [`Logger::lines`].
    #[cfg(test)]
    pub fn capture(verbose: bool) -> Self {
        Self::with_sink(verbose, Sink::Capture(Mutex::new(Vec::new())))
    }

    fn with_sink(verbose: bool, sink: Sink) -> Self {
        Self {
            inner: Arc::new(Inner {
                verbose,
                sink,
                status_lines: Mutex::new(0),
            }),
        }
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.inner.verbose
    }

    /// Captured lines (empty for the stdout sink).
    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        match &self.inner.sink {
            Sink::Capture(lines) => lines.lock().clone(),
            Sink::Stdout => Vec::new(),
        }
    }

    /// Log a message with a colored module prefix
    pub fn log(&self, module: &str, message: &str) {
        match &self.inner.sink {
            #[cfg(test)]
            Sink::Capture(lines) => lines.lock().push(format!("[{module}] {message}")),
            Sink::Stdout => {
                let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
                let mut stdout = stdout().lock();
                writeln!(stdout, "{prefix} {message}").ok();
                stdout.flush().ok();
                // Regular lines sit below the status block; never clear them
                *self.inner.status_lines.lock() = 0;
            }
        }
    }

    /// Display success status (✓ prefix, green).
    pub fn status_success(&self, message: &str) {
        self.status("✓", |symbol| symbol.green().to_string(), message);
    }

    /// Display error status (✗ prefix, red) with optional detail.
    pub fn status_error(&self, summary: &str, detail: &str) {
        let message = if detail.is_empty() {
            summary.to_string()
        } else {
            format!("{summary}\n{detail}")
        };
        self.status("✗", |symbol| symbol.red().to_string(), &message);
    }

    /// Status block that overwrites the previous one on a terminal.
    fn status(&self, symbol: &str, paint: impl FnOnce(&str) -> String, message: &str) {
        match &self.inner.sink {
            #[cfg(test)]
            Sink::Capture(lines) => {
                lines.lock().push(format!("{symbol} {message}"));
                return;
            }
            Sink::Stdout => {}
        }

        let mut last_lines = self.inner.status_lines.lock();
        let mut stdout = stdout().lock();
        let is_tty = stdout.is_terminal();

        if is_tty && *last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = *last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = format!("[{}]", now()).dimmed().to_string();
        writeln!(stdout, "{timestamp} {} {message}", paint(symbol)).ok();
        stdout.flush().ok();

        *last_lines = if is_tty {
            message.matches('\n').count() + 1
        } else {
            0
        };
    }
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

/// Get current UTC time formatted as HH:MM:SS
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

// ============================================================================
// Tests
// ============================================================================
