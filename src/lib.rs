//! # Rust Cascade Logger
//!
//! An in-process logging facility that renders a configurable header for
//! every record, colours it for terminals and writes it to the console and
//! to one size-rotated file per severity level.
//!
//! ## Features
//!
//! - **Line templates**: `{level}`, `{datetime}`, `{file}`, `{thread}`,
//!   `{indent}`, `{message}` and colour tags, scanned once at start-up
//! - **Cascading level files**: a record goes to its own level's file and to
//!   every lower level's file down to the configured threshold
//! - **Asynchronous delivery**: bounded queue with backpressure, drained on
//!   shutdown, FATAL records written before the process exits
//! - **Throttling and scopes**: first-N, every-N and every-interval call
//!   sites, indented scoped logging
//!
//! ## Example
//!
//! ```no_run
//! use rust_cascade_logger::prelude::*;
//! use rust_cascade_logger::info;
//!
//! let logger = Logger::builder()
//!     .config(
//!         LoggerConfig::new()
//!             .with_file_output("/var/log/myapp", "server")
//!             .with_file_level(LogLevel::Info)
//!             .with_async(true),
//!     )
//!     .build()?;
//!
//! info!(logger, "listening on port {}", 8080);
//! logger.shutdown();
//! # Ok::<(), LoggerError>(())
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, LevelFileSet, RotatingFileAppender};
    pub use crate::core::{
        Appender, DatetimePrecision, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerConfig,
        LoggerError, LoggerGuard, LoggerMetrics, Result, ScopeGuard, SourceLocation, ThrottleKey,
    };
}

pub use appenders::{ConsoleAppender, LevelFileSet, RotatingFileAppender, RotationPolicy};
pub use self::core::{
    Appender, DatetimePrecision, FatalHandler, LogLevel, LogRecord, Logger, LoggerBuilder,
    LoggerConfig, LoggerError, LoggerGuard, LoggerMetrics, Result, ScopeGuard, SourceLocation,
    ThrottleKey, ThrottleRegistry,
};
