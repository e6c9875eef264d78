//! Log record structure

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::panic::Location;

// Thread-local cache of the thread label to avoid repeated allocations
thread_local! {
    static THREAD_LABEL_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Name of the current thread, or its id when it is unnamed
fn current_thread_label() -> String {
    THREAD_LABEL_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let thread = std::thread::current();
                match thread.name() {
                    Some(name) => name.to_string(),
                    None => format!("{:?}", thread.id()),
                }
            })
            .clone()
    })
}

/// Call-site location of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    file: Cow<'static, str>,
    line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One captured log call.
///
/// Built once at the call site and never changed afterwards; asynchronous
/// delivery moves it into the queue unrendered.
///
/// # Examples
///
/// ```
/// use rust_cascade_logger::{LogLevel, LogRecord};
///
/// let record = LogRecord::new(LogLevel::Info, "a = {}, {}")
///     .with_args(["1", "c"])
///     .with_verbosity(2);
/// assert_eq!(record.message(), "a = 1, c");
/// assert!(record.location().file().ends_with(".rs"));
/// ```
#[derive(Debug, Clone)]
pub struct LogRecord {
    level: LogLevel,
    verbosity: u32,
    location: SourceLocation,
    timestamp: DateTime<Utc>,
    message_template: String,
    args: Vec<String>,
    thread: String,
    scope_depth: usize,
}

impl LogRecord {
    /// Capture a record at the caller's location.
    #[track_caller]
    pub fn new(level: LogLevel, message_template: impl Into<String>) -> Self {
        Self::at(level, SourceLocation::caller(), message_template)
    }

    /// Capture a record at an explicit location.
    pub fn at(
        level: LogLevel,
        location: SourceLocation,
        message_template: impl Into<String>,
    ) -> Self {
        Self {
            level,
            verbosity: 0,
            location,
            timestamp: Utc::now(),
            message_template: message_template.into(),
            args: Vec::new(),
            thread: current_thread_label(),
            scope_depth: 0,
        }
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub(crate) fn with_scope_depth(mut self, depth: usize) -> Self {
        self.scope_depth = depth;
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn verbosity(&self) -> u32 {
        self.verbosity
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// Scope nesting depth at the time the record was submitted.
    pub fn scope_depth(&self) -> usize {
        self.scope_depth
    }

    /// The message with its positional arguments substituted.
    pub fn message(&self) -> String {
        super::format::format_positional(&self.message_template, &self.args)
    }
}
