//! Logger configuration
//!
//! `LoggerConfig` is filled in by whatever loads configuration for the host
//! program (command line, environment, a file through serde) and handed to
//! [`Logger::builder`](crate::Logger::builder). The logger only reads it.

use super::datetime::{self, DatetimePrecision};
use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default line template: level, thread, time, call site, message.
pub const DEFAULT_LINE_FORMAT: &str = "{nc}{lc}{level}{nc} {gray}{thread}{nc} {bold}{white}@{nc} \
     {gray}{datetime}{nc} : {white}{italic}{file}{nc} {bold}{white}::{nc} {lc}{indent}{message}{nc}";

/// Default strftime pattern for `{datetime}`.
pub const DEFAULT_DATETIME_FORMAT: &str = "%a %b %d %T";

/// Default rotation threshold (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default bound of the asynchronous delivery queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Configuration consumed by the logger
///
/// # Examples
///
/// ```
/// use rust_cascade_logger::{LogLevel, LoggerConfig};
///
/// let config = LoggerConfig::new()
///     .with_console_level(LogLevel::Warning)
///     .with_file_output("/var/log/myapp", "server")
///     .with_async(true);
/// assert!(config.log_to_file);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Write records to the console sink
    pub log_to_console: bool,
    /// Minimum level shown on the console
    pub console_level: LogLevel,
    /// Write records to the per-level files
    pub log_to_file: bool,
    /// Lowest level that gets a file; records below it never reach a file
    pub file_level: LogLevel,
    /// Records with a higher verbosity than this are dropped
    pub verbosity: u32,
    /// Colourize the console line
    pub colorize: bool,
    /// Line template (see [`Renderer`](crate::core::Renderer) for the tags)
    pub line_format: String,
    /// strftime pattern for `{datetime}`
    pub datetime_format: String,
    /// Sub-second digits appended to `{datetime}`
    pub datetime_precision: DatetimePrecision,
    /// Bytes written to a level file before it is rotated, `0` disables rotation
    pub max_file_size: u64,
    /// Display width of the file name in `{file}`
    pub max_filename_len: usize,
    /// Minimum display width of the line number in `{file}`
    pub line_number_width: usize,
    /// Spaces per scope level in `{indent}`
    pub indent_width: usize,
    /// Deliver records on a background thread
    pub async_logging: bool,
    /// Maximum records waiting in the delivery queue before producers block
    pub queue_capacity: usize,
    /// Directory holding the level files
    pub log_dir: PathBuf,
    /// Base name of the level files, defaults to the process name
    pub log_basename: Option<String>,
    /// Keep existing level file content instead of truncating on first open
    pub append_to_existing: bool,
    /// Gzip the rotated backup
    pub compress_backup: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_to_console: true,
            console_level: LogLevel::Info,
            log_to_file: false,
            file_level: LogLevel::Trace,
            verbosity: 0,
            colorize: true,
            line_format: DEFAULT_LINE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            datetime_precision: DatetimePrecision::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_filename_len: 20,
            line_number_width: 4,
            indent_width: 2,
            async_logging: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_dir: PathBuf::from("log"),
            log_basename: None,
            append_to_existing: false,
            compress_backup: false,
        }
    }
}

impl LoggerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.log_to_console = enabled;
        self
    }

    #[must_use]
    pub fn with_console_level(mut self, level: LogLevel) -> Self {
        self.console_level = level;
        self
    }

    /// Enable the level files under `dir`, named `<basename>.<LEVEL>`
    #[must_use]
    pub fn with_file_output(mut self, dir: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        self.log_to_file = true;
        self.log_dir = dir.into();
        self.log_basename = Some(basename.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.log_to_file = enabled;
        self
    }

    #[must_use]
    pub fn with_file_level(mut self, level: LogLevel) -> Self {
        self.file_level = level;
        self
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    #[must_use]
    pub fn with_line_format(mut self, line_format: impl Into<String>) -> Self {
        self.line_format = line_format.into();
        self
    }

    #[must_use]
    pub fn with_datetime_format(
        mut self,
        pattern: impl Into<String>,
        precision: DatetimePrecision,
    ) -> Self {
        self.datetime_format = pattern.into();
        self.datetime_precision = precision;
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use]
    pub fn with_max_filename_len(mut self, width: usize) -> Self {
        self.max_filename_len = width;
        self
    }

    #[must_use]
    pub fn with_line_number_width(mut self, width: usize) -> Self {
        self.line_number_width = width;
        self
    }

    #[must_use]
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    #[must_use]
    pub fn with_async(mut self, enabled: bool) -> Self {
        self.async_logging = enabled;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_append_to_existing(mut self, append: bool) -> Self {
        self.append_to_existing = append;
        self
    }

    #[must_use]
    pub fn with_compress_backup(mut self, compress: bool) -> Self {
        self.compress_backup = compress;
        self
    }

    /// True if at least one sink would receive records.
    #[inline]
    pub fn any_sink_enabled(&self) -> bool {
        self.log_to_console || self.log_to_file
    }

    /// Lowest level any enabled sink accepts.
    pub fn min_enabled_level(&self) -> Option<LogLevel> {
        match (self.log_to_console, self.log_to_file) {
            (true, true) => Some(self.console_level.min(self.file_level)),
            (true, false) => Some(self.console_level),
            (false, true) => Some(self.file_level),
            (false, false) => None,
        }
    }

    /// Base name of the level files.
    pub fn resolved_basename(&self) -> String {
        if let Some(name) = self.log_basename.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        std::env::current_exe()
            .ok()
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| "log".to_string())
    }

    /// Path of the file receiving records for `level`.
    pub fn level_file_path(&self, level: LogLevel) -> PathBuf {
        self.log_dir
            .join(format!("{}.{}", self.resolved_basename(), level.to_str()))
    }

    /// Reject settings the logger cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(LoggerError::config(
                "queue_capacity",
                "must be greater than zero",
            ));
        }
        if self.line_format.is_empty() {
            return Err(LoggerError::config("line_format", "must not be empty"));
        }
        datetime::validate_pattern(&self.datetime_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert!(config.log_to_console);
        assert!(!config.log_to_file);
        assert_eq!(config.console_level, LogLevel::Info);
        assert_eq!(config.file_level, LogLevel::Trace);
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.queue_capacity, 10_000);
        assert_eq!(config.datetime_precision, DatetimePrecision::Micros);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = LoggerConfig::new()
            .with_console(false)
            .with_file_output("/tmp/logs", "app")
            .with_file_level(LogLevel::Info)
            .with_verbosity(3)
            .with_async(true)
            .with_queue_capacity(16);

        assert!(!config.log_to_console);
        assert!(config.log_to_file);
        assert_eq!(config.verbosity, 3);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(
            config.level_file_path(LogLevel::Warning),
            PathBuf::from("/tmp/logs").join("app.WARNING")
        );
    }

    #[test]
    fn test_min_enabled_level() {
        let config = LoggerConfig::new()
            .with_console_level(LogLevel::Error)
            .with_file(true)
            .with_file_level(LogLevel::Debug);
        assert_eq!(config.min_enabled_level(), Some(LogLevel::Debug));

        let config = config.with_file(false);
        assert_eq!(config.min_enabled_level(), Some(LogLevel::Error));

        let config = config.with_console(false);
        assert_eq!(config.min_enabled_level(), None);
        assert!(!config.any_sink_enabled());
    }

    #[test]
    fn test_validation() {
        let err = LoggerConfig::new().with_queue_capacity(0).validate().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { ref component, .. } if component == "queue_capacity"));

        assert!(LoggerConfig::new().with_line_format("").validate().is_err());
        assert!(LoggerConfig::new()
            .with_datetime_format("%Q", DatetimePrecision::Seconds)
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LoggerConfig = serde_json::from_str(
            r#"{
                "console_level": "warning",
                "log_to_file": true,
                "datetime_precision": "ms",
                "log_dir": "/var/log/app"
            }"#,
        )
        .unwrap();

        assert_eq!(config.console_level, LogLevel::Warning);
        assert!(config.log_to_file);
        assert_eq!(config.datetime_precision, DatetimePrecision::Millis);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/app"));
        assert_eq!(config.line_format, DEFAULT_LINE_FORMAT);
    }

    #[test]
    fn test_deserialize_rejects_bad_level() {
        let result: std::result::Result<LoggerConfig, _> =
            serde_json::from_str(r#"{ "file_level": "chatty" }"#);
        assert!(result.is_err());
    }
}
