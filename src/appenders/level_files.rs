//! One rotating file per level, cascading
//!
//! A record at level `L` is written to the files of every level from the
//! configured file threshold up to and including `L`. The TRACE file
//! therefore holds the most records and the FATAL file only FATAL ones.

use super::rotating_file::{RotatingFileAppender, RotationPolicy};
use crate::core::appender::Appender;
use crate::core::config::LoggerConfig;
use crate::core::error::{LoggerError, Result};
use crate::core::log_level::LogLevel;
use crate::core::log_record::LogRecord;
use std::path::Path;

/// The per-level files of one logger
///
/// # Examples
///
/// ```no_run
/// use rust_cascade_logger::appenders::LevelFileSet;
/// use rust_cascade_logger::{LogLevel, LogRecord, LoggerConfig};
///
/// let config = LoggerConfig::new()
///     .with_file_output("/tmp/myapp", "server")
///     .with_file_level(LogLevel::Info);
/// let mut files = LevelFileSet::from_config(&config);
///
/// let record = LogRecord::new(LogLevel::Warning, "disk almost full");
/// // Lands in server.INFO and server.WARNING
/// files.write(&record, "W disk almost full").unwrap();
/// ```
pub struct LevelFileSet {
    threshold: LogLevel,
    files: Vec<RotatingFileAppender>,
}

impl LevelFileSet {
    pub fn from_config(config: &LoggerConfig) -> Self {
        let policy = RotationPolicy::new()
            .with_max_size(config.max_file_size)
            .with_compression(config.compress_backup)
            .with_append(config.append_to_existing);

        let files = LogLevel::ALL
            .iter()
            .map(|&level| RotatingFileAppender::new(config.level_file_path(level), policy.clone()))
            .collect();

        Self {
            threshold: config.file_level,
            files,
        }
    }

    /// Lowest level that has a file.
    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// True if a record at `level` reaches at least one file.
    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        level >= self.threshold
    }

    /// Path of the file for `level`.
    pub fn path(&self, level: LogLevel) -> &Path {
        self.files[level.index()].path()
    }

    /// The appender backing the file for `level`.
    pub fn file(&self, level: LogLevel) -> &RotatingFileAppender {
        &self.files[level.index()]
    }

    /// Write `line` to every file from the threshold up to the record's level.
    ///
    /// Every target file is attempted; the first error is returned.
    pub fn write(&mut self, record: &LogRecord, line: &str) -> Result<()> {
        if !self.accepts(record.level()) {
            return Ok(());
        }

        let mut first_error: Option<LoggerError> = None;
        let targets = self.threshold.index()..=record.level().index();
        for file in &mut self.files[targets] {
            if let Err(e) = file.append(record, line) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Flush every open file.
    pub fn flush(&mut self) -> Result<()> {
        let mut first_error: Option<LoggerError> = None;
        for file in &mut self.files {
            if let Err(e) = file.flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Appender for LevelFileSet {
    fn append(&mut self, record: &LogRecord, line: &str) -> Result<()> {
        self.write(record, line)
    }

    fn flush(&mut self) -> Result<()> {
        LevelFileSet::flush(self)
    }

    fn name(&self) -> &str {
        "level-files"
    }
}
