//! Logging infrastructure for RedirectConsole
//!
//! This module sets up structured logging using the tracing crate.
//! Session lifecycle transitions log at info, per-event engine traffic at
//! debug, ignored commands at warn.

use tracing_subscriber::{fmt, EnvFilter};

/// Log level configuration
#[derive(Debug, Clone, Copy, Default)]
pub enum LogLevel {
    /// Trace level - very verbose
    Trace,
    /// Debug level - detailed information
    Debug,
    /// Info level - general information
    #[default]
    Info,
    /// Warn level - warnings
    Warn,
    /// Error level - errors only
    Error,
}

impl LogLevel {
    /// Converts LogLevel to tracing level filter string
    fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Default filter directive scoped to this crate
    fn default_directive(&self) -> String {
        format!("redirect_console={}", self.as_filter_str())
    }
}

/// Initializes the logging system
///
/// Sets up tracing subscriber with the specified log level.
/// Can be overridden by RUST_LOG environment variable.
///
/// # Examples
///
/// ```no_run
/// use redirect_console::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.default_directive()));

    // A host application may already own the global subscriber
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}

/// Initializes logging with default settings
pub fn init_default_logging() {
    init_logging(LogLevel::default());
}
