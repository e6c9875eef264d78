//! Scoped, indented logging
//!
//! [`Logger::scope`](crate::Logger::scope) logs an entry line, raises the
//! scope depth so records logged inside render with extra `{indent}`, and
//! returns a [`ScopeGuard`] that logs the exit line and lowers the depth when
//! it is dropped, on every exit path.
//!
//! The depth belongs to the logger, not to a thread. Scopes opened on several
//! threads at once indent each other's records.

use super::log_level::LogLevel;
use super::log_record::SourceLocation;
use super::logger::Logger;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Nesting counter for scoped logging.
#[derive(Debug, Default)]
pub struct ScopeDepth(AtomicUsize);

impl ScopeDepth {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Current nesting depth.
    #[inline]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Enter a scope, returning the new depth.
    pub fn enter(&self) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Leave a scope, never going below zero.
    pub fn exit(&self) -> usize {
        let previous = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| Some(d.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }
}

/// Open scope; logs the exit line and unindents when dropped.
///
/// # Example
///
/// ```
/// use rust_cascade_logger::{LogLevel, Logger, LoggerConfig};
///
/// let logger = Logger::builder()
///     .config(LoggerConfig::new().with_console(false))
///     .build()
///     .unwrap();
///
/// {
///     let _scope = logger.scope(LogLevel::Debug, "load config");
///     assert_eq!(logger.scope_depth(), 1);
/// }
/// assert_eq!(logger.scope_depth(), 0);
/// ```
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
    logger: &'a Logger,
    level: LogLevel,
    label: String,
    location: SourceLocation,
}

impl<'a> ScopeGuard<'a> {
    pub(crate) fn new(
        logger: &'a Logger,
        level: LogLevel,
        label: String,
        location: SourceLocation,
    ) -> Self {
        Self {
            logger,
            level,
            label,
            location,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.logger.end_scope(self.level, &self.label, self.location.clone());
    }
}
