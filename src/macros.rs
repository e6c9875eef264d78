//! Logging macros
//!
//! The macros check whether the record would be written before anything is
//! converted or allocated, then capture the call site and hand the record to
//! the logger. Arguments are substituted positionally into the message: `{}`
//! takes the next argument and `{N}` takes argument `N`. Any `Display` value
//! can be an argument.
//!
//! Every macro takes an optional logger as its first argument. Without one the
//! process-wide default from [`crate::core::global`] is used.
//!
//! # Examples
//!
//! ```
//! use rust_cascade_logger::prelude::*;
//! use rust_cascade_logger::{info, warn};
//!
//! let logger = Logger::builder()
//!     .config(LoggerConfig::new().with_colorize(false))
//!     .build()
//!     .unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // Positional arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! warn!(logger, "{1} of {0} workers busy", 8, 7);
//!
//! // Default logger
//! info!("no logger argument needed");
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __log_record {
    ($logger:expr, $verbosity:expr, $level:expr, $fmt:literal $(, $arg:expr)*) => {{
        let logger = &$logger;
        let level: $crate::LogLevel = $level;
        let verbosity: u32 = $verbosity;
        if level == $crate::LogLevel::Fatal || logger.enabled(level, verbosity) {
            let args: ::std::vec::Vec<::std::string::String> =
                ::std::vec![$(::std::string::ToString::to_string(&$arg)),*];
            logger.submit(
                $crate::LogRecord::new(level, $fmt)
                    .with_verbosity(verbosity)
                    .with_args(args),
            );
        } else {
            logger.metrics().record_filtered();
        }
    }};
}

/// Log a message at a given level.
///
/// # Examples
///
/// ```
/// # use rust_cascade_logger::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_cascade_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// log!(LogLevel::Info, "on the default logger");
/// ```
#[macro_export]
macro_rules! log {
    ($level:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__log_record!($crate::core::global::logger(), 0, $level, $fmt $(, $arg)*)
    };
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__log_record!($logger, 0, $level, $fmt $(, $arg)*)
    };
}

/// Log with a verbosity; dropped when it exceeds the configured ceiling.
///
/// # Examples
///
/// ```
/// # use rust_cascade_logger::prelude::*;
/// # let logger = Logger::builder()
/// #     .config(LoggerConfig::new().with_verbosity(2))
/// #     .build()
/// #     .unwrap();
/// use rust_cascade_logger::vlog;
/// vlog!(logger, 2, LogLevel::Debug, "shown with verbosity >= 2");
/// vlog!(logger, 3, LogLevel::Info, "packet dump: {}", "...");
/// ```
#[macro_export]
macro_rules! vlog {
    ($verbosity:expr, $level:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__log_record!($crate::core::global::logger(), $verbosity, $level, $fmt $(, $arg)*)
    };
    ($logger:expr, $verbosity:expr, $level:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__log_record!($logger, $verbosity, $level, $fmt $(, $arg)*)
    };
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_cascade_logger::prelude::*;
/// # let logger = Logger::builder()
/// #     .config(LoggerConfig::new().with_console_level(LogLevel::Trace))
/// #     .build()
/// #     .unwrap();
/// use rust_cascade_logger::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($crate::LogLevel::Trace, $fmt $(, $arg)*)
    };
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $fmt $(, $arg)*)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($crate::LogLevel::Debug, $fmt $(, $arg)*)
    };
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $fmt $(, $arg)*)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_cascade_logger::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_cascade_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($crate::LogLevel::Info, $fmt $(, $arg)*)
    };
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Info, $fmt $(, $arg)*)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($crate::LogLevel::Warning, $fmt $(, $arg)*)
    };
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $fmt $(, $arg)*)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_cascade_logger::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_cascade_logger::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($crate::LogLevel::Error, $fmt $(, $arg)*)
    };
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Error, $fmt $(, $arg)*)
    };
}

/// Log a fatal-level message, then run the logger's fatal handler.
///
/// With the default handler the process exits with status 1 once the record
/// has been written.
///
/// # Examples
///
/// ```no_run
/// # use rust_cascade_logger::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_cascade_logger::fatal;
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($crate::LogLevel::Fatal, $fmt $(, $arg)*)
    };
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $fmt $(, $arg)*)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Appender, LogLevel, LogRecord, Logger, LoggerConfig, Result};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<(String, u32)>>>);

    impl Appender for Capture {
        fn append(&mut self, record: &LogRecord, line: &str) -> Result<()> {
            self.0.lock().push((line.to_string(), record.location().line()));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    fn logger(config: LoggerConfig) -> (Logger, Capture) {
        let capture = Capture::default();
        let logger = Logger::builder()
            .config(config.with_colorize(false).with_line_format("{level}:{message}"))
            .console_appender(capture.clone())
            .on_fatal(|| {})
            .build()
            .unwrap();
        (logger, capture)
    }

    #[test]
    fn test_macros_format_positional_arguments() {
        let (logger, capture) = logger(LoggerConfig::new().with_console_level(LogLevel::Trace));
        trace!(logger, "t {}", 1);
        debug!(logger, "d {} {}", "a", 2.5);
        info!(logger, "{1}-{0}", "x", "y");
        warn!(logger, "w");
        error!(logger, "e {}", 'c',);
        log!(logger, LogLevel::Info, "plain");

        let lines: Vec<String> = capture.0.lock().iter().map(|(l, _)| l.clone()).collect();
        assert_eq!(
            lines,
            vec!["T:t 1", "D:d a 2.5", "I:y-x", "W:w", "E:e c", "I:plain"]
        );
    }

    #[test]
    fn test_macro_captures_call_site() {
        let (logger, capture) = logger(LoggerConfig::new());
        let line = line!() + 1;
        info!(logger, "here");
        assert_eq!(capture.0.lock()[0].1, line);
    }

    #[test]
    fn test_disabled_arguments_are_not_evaluated() {
        let (logger, capture) = logger(LoggerConfig::new().with_verbosity(1));
        let mut evaluated = false;
        let mut expensive = || {
            evaluated = true;
            "costly"
        };
        debug!(logger, "{}", expensive());
        vlog!(logger, 2, LogLevel::Info, "{}", "too verbose");
        vlog!(logger, 1, LogLevel::Info, "ok");

        assert!(!evaluated);
        assert_eq!(capture.0.lock().len(), 1);
        assert_eq!(logger.metrics().records_filtered(), 2);
    }

    #[test]
    fn test_fatal_macro_runs_handler() {
        let (logger, capture) = logger(LoggerConfig::new());
        fatal!(logger, "bye {}", 1);
        assert_eq!(capture.0.lock()[0].0, "F:bye 1");
    }
}
