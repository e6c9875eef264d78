//! Console appender implementation

use crate::core::{Appender, LogRecord, Result};
use std::io::{self, Write};

/// Stream the console appender writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleTarget {
    #[default]
    Stderr,
    Stdout,
}

/// Writes each line to the process's standard error (or output) and flushes.
pub struct ConsoleAppender {
    target: ConsoleTarget,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            target: ConsoleTarget::Stderr,
        }
    }

    /// Write to standard output instead of standard error
    ///
    /// # Example
    ///
    /// ```
    /// use rust_cascade_logger::appenders::{ConsoleAppender, ConsoleTarget};
    ///
    /// let appender = ConsoleAppender::new().with_target(ConsoleTarget::Stdout);
    /// assert_eq!(appender.target(), ConsoleTarget::Stdout);
    /// ```
    #[must_use]
    pub fn with_target(mut self, target: ConsoleTarget) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, _record: &LogRecord, line: &str) -> Result<()> {
        match self.target {
            ConsoleTarget::Stderr => {
                let mut out = io::stderr().lock();
                writeln!(out, "{}", line)?;
                out.flush()?;
            }
            ConsoleTarget::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{}", line)?;
                out.flush()?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stderr => io::stderr().flush()?,
            ConsoleTarget::Stdout => io::stdout().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    #[test]
    fn test_default_target_is_stderr() {
        let appender = ConsoleAppender::default();
        assert_eq!(appender.target(), ConsoleTarget::Stderr);
        assert_eq!(appender.name(), "console");
    }

    #[test]
    fn test_append_and_flush() {
        let mut appender = ConsoleAppender::new();
        let record = LogRecord::new(LogLevel::Info, "console test");
        assert!(appender.append(&record, "I console test").is_ok());
        assert!(appender.flush().is_ok());
    }
}
