//! Appender trait for log output destinations

use super::{error::Result, log_record::LogRecord};

/// A destination for rendered lines.
///
/// Appenders are only ever driven by one thread at a time: the logger calls
/// them while holding its emit lock.
pub trait Appender: Send {
    /// Write one rendered line (without trailing newline) for `record`.
    fn append(&mut self, record: &LogRecord, line: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
