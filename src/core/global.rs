//! Process-wide default logger
//!
//! Libraries and quick programs that do not want to pass a [`Logger`] around
//! can install one with [`init`] and reach it through [`logger`]. The returned
//! [`LoggerGuard`] drains and stops the installed logger when it goes out of
//! scope, so keep it alive in `main`:
//!
//! ```no_run
//! use rust_cascade_logger::core::global;
//! use rust_cascade_logger::{info, LoggerConfig};
//!
//! fn main() -> rust_cascade_logger::Result<()> {
//!     let _guard = global::init(LoggerConfig::new().with_async(true))?;
//!     info!("listening on {}", 8080);
//!     Ok(())
//! }
//! ```
//!
//! Before `init` is called, [`logger`] hands out a synchronous console logger
//! with the default configuration.

use super::config::LoggerConfig;
use super::error::{LoggerError, Result};
use super::logger::{Logger, LoggerBuilder};
use std::sync::OnceLock;

static INSTALLED: OnceLock<Logger> = OnceLock::new();
static FALLBACK: OnceLock<Logger> = OnceLock::new();

/// Install the default logger built from `config`.
///
/// Fails if a default logger has already been installed.
pub fn init(config: LoggerConfig) -> Result<LoggerGuard> {
    init_with(Logger::builder().config(config))
}

/// Install the default logger from a prepared builder.
pub fn init_with(builder: LoggerBuilder) -> Result<LoggerGuard> {
    if INSTALLED.get().is_some() {
        return Err(already_initialized());
    }

    let logger = builder.build()?;
    INSTALLED.set(logger).map_err(|rejected| {
        // Lost a race with another init; stop the worker we just started
        rejected.shutdown();
        already_initialized()
    })?;

    match INSTALLED.get() {
        Some(logger) => Ok(LoggerGuard { logger }),
        None => Err(already_initialized()),
    }
}

fn already_initialized() -> LoggerError {
    LoggerError::config("global", "default logger is already initialized")
}

/// The default logger.
pub fn logger() -> &'static Logger {
    INSTALLED
        .get()
        .unwrap_or_else(|| FALLBACK.get_or_init(|| Logger::synchronous(LoggerConfig::default())))
}

/// True once [`init`] has succeeded.
pub fn is_initialized() -> bool {
    INSTALLED.get().is_some()
}

/// Keeps the default logger running; shuts it down when dropped.
///
/// Dropping the guard blocks until every queued record has been written and
/// the delivery thread has exited.
#[must_use = "the logger is shut down as soon as the guard is dropped"]
pub struct LoggerGuard {
    logger: &'static Logger,
}

impl LoggerGuard {
    pub fn logger(&self) -> &'static Logger {
        self.logger
    }
}

impl std::ops::Deref for LoggerGuard {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        self.logger
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        self.logger.shutdown();
    }
}
