//! Main logger implementation
//!
//! A [`Logger`] owns everything a logging setup needs at run time: the
//! rendered-line template, the console and level-file sinks behind a single
//! emit lock, the scope depth, the throttle registry and, in asynchronous
//! mode, the delivery queue and its worker thread.
//!
//! Records pass three cheap checks before anything is rendered: is any sink
//! enabled, is the verbosity within the configured ceiling, and is the level
//! at or above the lowest sink threshold. Survivors are either emitted on the
//! calling thread under the emit lock or pushed onto the queue for the worker.

use super::{
    appender::Appender,
    config::LoggerConfig,
    delivery_queue::{DeliveryQueue, Stopped},
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::{LogRecord, SourceLocation},
    metrics::LoggerMetrics,
    render::Renderer,
    scope::{ScopeDepth, ScopeGuard},
    throttle::{ThrottleKey, ThrottleRegistry},
};
use crate::appenders::{ConsoleAppender, LevelFileSet};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Called after a FATAL record has been delivered.
///
/// The default handler exits the process with status 1.
pub type FatalHandler = Arc<dyn Fn() + Send + Sync>;

/// Name of the asynchronous delivery thread.
pub const WORKER_THREAD_NAME: &str = "log-delivery";

fn default_fatal_handler() -> FatalHandler {
    Arc::new(|| std::process::exit(1))
}

/// What travels through the delivery queue.
struct Envelope {
    record: LogRecord,
    /// Signalled once the record has been written, used for FATAL
    delivered: Option<Sender<()>>,
}

struct Sinks {
    console: Option<Box<dyn Appender>>,
    console_failing: bool,
    files: Option<LevelFileSet>,
}

/// State shared between callers and the delivery worker.
struct Shared {
    config: LoggerConfig,
    min_level: Option<LogLevel>,
    renderer: Renderer,
    /// The emit lock
    sinks: Mutex<Sinks>,
    metrics: LoggerMetrics,
}

impl Shared {
    /// Render `record` and write it to every sink whose threshold it meets.
    fn emit(&self, record: &LogRecord) {
        let level = record.level();
        let mut sinks = self.sinks.lock();

        let to_console = sinks.console.is_some() && level >= self.config.console_level;
        let to_files = sinks.files.as_ref().is_some_and(|files| files.accepts(level));
        if !to_console && !to_files {
            self.metrics.record_filtered();
            return;
        }

        let colorize = self.config.colorize;
        let rendered = self.renderer.render_outputs(
            record,
            to_console && colorize,
            to_files || (to_console && !colorize),
        );

        let mut delivered = false;
        let sinks = &mut *sinks;

        if to_console {
            let line = if colorize {
                rendered.colored.as_deref()
            } else {
                rendered.plain.as_deref()
            };
            if let (Some(console), Some(line)) = (sinks.console.as_mut(), line) {
                match append_isolated(&mut **console, record, line) {
                    SinkOutcome::Written => {
                        if sinks.console_failing {
                            sinks.console_failing = false;
                            eprintln!("[LOGGER WARNING] Console sink is writable again.");
                        }
                        delivered = true;
                    }
                    SinkOutcome::Failed(e) => {
                        self.metrics.record_sink_error();
                        if !sinks.console_failing {
                            sinks.console_failing = true;
                            eprintln!("[LOGGER ERROR] Console sink failed: {}", e);
                        }
                    }
                    SinkOutcome::Panicked => {
                        self.metrics.record_sink_error();
                    }
                }
            }
        }

        if to_files {
            if let (Some(files), Some(line)) = (sinks.files.as_mut(), rendered.plain.as_deref()) {
                // Each file reports its own failure streak
                match append_isolated(files, record, line) {
                    SinkOutcome::Written => delivered = true,
                    SinkOutcome::Failed(_) | SinkOutcome::Panicked => {
                        self.metrics.record_sink_error();
                    }
                }
            }
        }

        if delivered {
            self.metrics.record_emitted();
        }
    }

    fn flush_sinks(&self) -> Result<()> {
        let mut sinks = self.sinks.lock();
        let mut first_error: Option<LoggerError> = None;

        if let Some(console) = sinks.console.as_mut() {
            if let Err(e) = console.flush() {
                first_error.get_or_insert(e);
            }
        }
        if let Some(files) = sinks.files.as_mut() {
            if let Err(e) = files.flush() {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

enum SinkOutcome {
    Written,
    Failed(LoggerError),
    Panicked,
}

/// Call one sink with panic isolation, so one broken sink cannot take the
/// others down with it.
fn append_isolated(sink: &mut dyn Appender, record: &LogRecord, line: &str) -> SinkOutcome {
    match catch_unwind(AssertUnwindSafe(|| sink.append(record, line))) {
        Ok(Ok(())) => SinkOutcome::Written,
        Ok(Err(e)) => SinkOutcome::Failed(e),
        Err(panic_info) => {
            eprintln!(
                "[LOGGER CRITICAL] Sink '{}' panicked: {}. Other sinks continue to function.",
                sink.name(),
                panic_message(panic_info.as_ref())
            );
            SinkOutcome::Panicked
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Body of the delivery thread: pop, emit, acknowledge, until shut down and empty.
fn run_worker(shared: Arc<Shared>, queue: Arc<DeliveryQueue<Envelope>>) {
    while let Some(envelope) = queue.pop() {
        if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| shared.emit(&envelope.record))) {
            eprintln!(
                "[LOGGER CRITICAL] Rendering panicked on the delivery thread: {}. Record dropped.",
                panic_message(panic_info.as_ref())
            );
        }
        if let Some(delivered) = envelope.delivered {
            let _ = delivered.send(());
        }
        queue.complete();
    }
}

/// The logging context object
///
/// Create one through [`Logger::builder`], pass it (or an `Arc` of it) to the
/// code that logs, and drop it or call [`shutdown`](Logger::shutdown) when
/// done. For a process-wide default instance see [`crate::core::global`].
///
/// # Example
///
/// ```
/// use rust_cascade_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .config(LoggerConfig::new().with_console_level(LogLevel::Debug).with_colorize(false))
///     .build()
///     .unwrap();
///
/// logger.info("service started");
/// logger.log_args(LogLevel::Warning, "queue at {}% after {} retries", ["93", "4"]);
/// logger.shutdown();
/// ```
pub struct Logger {
    shared: Arc<Shared>,
    queue: Option<Arc<DeliveryQueue<Envelope>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    scope: ScopeDepth,
    throttle: ThrottleRegistry,
    on_fatal: FatalHandler,
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Build a logger from `config` with the default sinks.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Synchronous logger that skips validation, for the default global instance.
    pub(crate) fn synchronous(config: LoggerConfig) -> Self {
        Self::assemble(config, None, default_fatal_handler())
    }

    fn assemble(
        config: LoggerConfig,
        console: Option<Box<dyn Appender>>,
        on_fatal: FatalHandler,
    ) -> Self {
        let console = config
            .log_to_console
            .then(|| console.unwrap_or_else(|| Box::new(ConsoleAppender::new())));
        let files = config
            .log_to_file
            .then(|| LevelFileSet::from_config(&config));

        let shared = Shared {
            min_level: config.min_enabled_level(),
            renderer: Renderer::from_config(&config),
            sinks: Mutex::new(Sinks {
                console,
                console_failing: false,
                files,
            }),
            metrics: LoggerMetrics::new(),
            config,
        };

        Self {
            shared: Arc::new(shared),
            queue: None,
            worker: Mutex::new(None),
            scope: ScopeDepth::new(),
            throttle: ThrottleRegistry::new(),
            on_fatal,
        }
    }

    fn start_worker(&mut self) -> Result<()> {
        let queue = Arc::new(DeliveryQueue::new(self.shared.config.queue_capacity));
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn({
                let shared = Arc::clone(&self.shared);
                let queue = Arc::clone(&queue);
                move || run_worker(shared, queue)
            })
            .map_err(|e| {
                LoggerError::io_operation(
                    "spawn delivery thread",
                    "Failed to start the asynchronous delivery thread",
                    e,
                )
            })?;

        self.queue = Some(queue);
        *self.worker.get_mut() = Some(handle);
        Ok(())
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.shared.config
    }

    pub fn renderer(&self) -> &Renderer {
        &self.shared.renderer
    }

    /// Delivery counters
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    /// Registry behind the throttled logging calls, for explicit keys.
    pub fn throttle(&self) -> &ThrottleRegistry {
        &self.throttle
    }

    /// True if records are delivered on the background thread.
    pub fn is_async(&self) -> bool {
        self.queue.is_some()
    }

    /// Would a record with this level and verbosity reach any sink?
    ///
    /// Check this before building an expensive message.
    #[inline]
    pub fn enabled(&self, level: LogLevel, verbosity: u32) -> bool {
        if !self.shared.config.any_sink_enabled() {
            return false;
        }
        if verbosity > self.shared.config.verbosity {
            return false;
        }
        self.shared.min_level.is_some_and(|min| level >= min)
    }

    /// Filter and deliver a record.
    ///
    /// A FATAL record is delivered (the call blocks until it has been written,
    /// also in asynchronous mode) and then the fatal handler runs. The handler
    /// runs even when the record itself was filtered out.
    pub fn submit(&self, record: LogRecord) {
        let level = record.level();
        if !self.enabled(level, record.verbosity()) {
            self.shared.metrics.record_filtered();
            if level == LogLevel::Fatal {
                (self.on_fatal)();
            }
            return;
        }

        let record = record.with_scope_depth(self.scope.get());
        if level == LogLevel::Fatal {
            self.deliver_and_wait(record);
            (self.on_fatal)();
        } else {
            self.deliver(record);
        }
    }

    fn deliver(&self, record: LogRecord) {
        match &self.queue {
            Some(queue) => {
                let envelope = Envelope {
                    record,
                    delivered: None,
                };
                match queue.push(envelope) {
                    Ok(pushed) => {
                        if pushed.waited {
                            self.shared.metrics.record_backpressure_wait();
                        }
                    }
                    // After shutdown records are written on the caller's thread
                    Err(Stopped(envelope)) => self.shared.emit(&envelope.record),
                }
            }
            None => self.shared.emit(&record),
        }
    }

    fn deliver_and_wait(&self, record: LogRecord) {
        let Some(queue) = &self.queue else {
            self.shared.emit(&record);
            return;
        };

        let (delivered_tx, delivered_rx) = bounded(1);
        let envelope = Envelope {
            record,
            delivered: Some(delivered_tx),
        };
        match queue.push(envelope) {
            Ok(pushed) => {
                if pushed.waited {
                    self.shared.metrics.record_backpressure_wait();
                }
                // Disconnection means the worker dropped the envelope; nothing left to wait for
                let _ = delivered_rx.recv();
            }
            Err(Stopped(envelope)) => self.shared.emit(&envelope.record),
        }
    }

    /// Log a message at `level` from the caller's location.
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if level == LogLevel::Fatal || self.enabled(level, 0) {
            self.submit(LogRecord::new(level, message));
        } else {
            self.shared.metrics.record_filtered();
        }
    }

    /// Log a message template with positional arguments (`{}` or `{0}`).
    #[track_caller]
    pub fn log_args<I, S>(&self, level: LogLevel, template: &str, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if level == LogLevel::Fatal || self.enabled(level, 0) {
            self.submit(LogRecord::new(level, template).with_args(args));
        } else {
            self.shared.metrics.record_filtered();
        }
    }

    /// Log with a verbosity; dropped when `verbosity` exceeds the configured ceiling.
    #[track_caller]
    pub fn vlog(&self, verbosity: u32, level: LogLevel, message: impl Into<String>) {
        if level == LogLevel::Fatal || self.enabled(level, verbosity) {
            self.submit(LogRecord::new(level, message).with_verbosity(verbosity));
        } else {
            self.shared.metrics.record_filtered();
        }
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Log at FATAL, then run the fatal handler (by default the process exits).
    #[inline]
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Log only the first `n` times this call site is reached.
    #[track_caller]
    pub fn log_first_n(&self, n: u64, level: LogLevel, message: impl Into<String>) {
        let location = SourceLocation::caller();
        if self.throttle.first_n(&ThrottleKey::Site(location.clone()), n) {
            self.submit(LogRecord::at(level, location, message));
        } else {
            self.shared.metrics.record_filtered();
        }
    }

    /// Log the first time and then every `n`th time this call site is reached.
    #[track_caller]
    pub fn log_every_n(&self, n: u64, level: LogLevel, message: impl Into<String>) {
        let location = SourceLocation::caller();
        if self.throttle.every_n(&ThrottleKey::Site(location.clone()), n) {
            self.submit(LogRecord::at(level, location, message));
        } else {
            self.shared.metrics.record_filtered();
        }
    }

    /// Log at most once per `interval` from this call site.
    #[track_caller]
    pub fn log_every_interval(&self, interval: Duration, level: LogLevel, message: impl Into<String>) {
        let location = SourceLocation::caller();
        if self
            .throttle
            .every_interval(&ThrottleKey::Site(location.clone()), interval)
        {
            self.submit(LogRecord::at(level, location, message));
        } else {
            self.shared.metrics.record_filtered();
        }
    }

    /// Open a logged, indented scope.
    ///
    /// Logs `-> label`, indents records logged while the guard lives, and logs
    /// `<- label` when the guard drops.
    #[track_caller]
    pub fn scope(&self, level: LogLevel, label: impl Into<String>) -> ScopeGuard<'_> {
        let label = label.into();
        let location = SourceLocation::caller();
        self.submit(LogRecord::at(level, location.clone(), "-> {}").with_args([label.as_str()]));
        self.scope.enter();
        ScopeGuard::new(self, level, label, location)
    }

    pub(crate) fn end_scope(&self, level: LogLevel, label: &str, location: SourceLocation) {
        self.scope.exit();
        self.submit(LogRecord::at(level, location, "<- {}").with_args([label]));
    }

    /// Current scope nesting depth.
    pub fn scope_depth(&self) -> usize {
        self.scope.get()
    }

    /// Records waiting in the delivery queue.
    pub fn queued(&self) -> usize {
        self.queue.as_ref().map_or(0, |queue| queue.len())
    }

    /// Block until every record submitted so far has been written, then flush the sinks.
    pub fn flush(&self) -> Result<()> {
        if let Some(queue) = &self.queue {
            queue.wait_drained();
        }
        self.shared.flush_sinks()
    }

    /// Drain the queue, stop the worker and flush the sinks.
    ///
    /// Blocks until every record queued before the call has been written,
    /// also when another thread is shutting down at the same time. Calling it
    /// again is a no-op apart from another flush. Records logged afterwards
    /// are written synchronously.
    pub fn shutdown(&self) {
        // Held through the join so concurrent callers wait for the drain
        let mut worker = self.worker.lock();

        if let Some(queue) = &self.queue {
            queue.shutdown();

            if let Some(handle) = worker.take() {
                if let Err(e) = handle.join() {
                    eprintln!(
                        "[LOGGER ERROR] Delivery thread panicked during shutdown: {}",
                        panic_message(e.as_ref())
                    );
                    // Write what the dead worker left behind
                    for envelope in queue.take_remaining() {
                        self.shared.emit(&envelope.record);
                        if let Some(delivered) = envelope.delivered {
                            let _ = delivered.send(());
                        }
                    }
                }
            }
        }
        drop(worker);

        if let Err(e) = self.shared.flush_sinks() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_cascade_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .config(LoggerConfig::new().with_console_level(LogLevel::Warning))
///     .async_mode(1000)
///     .on_fatal(|| eprintln!("fatal record written"))
///     .build()
///     .unwrap();
/// assert!(logger.is_async());
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    console: Option<Box<dyn Appender>>,
    on_fatal: Option<FatalHandler>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            console: None,
            on_fatal: None,
        }
    }

    /// Replace the whole configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable asynchronous delivery with a queue of `capacity` records
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, capacity: usize) -> Self {
        self.config.async_logging = true;
        self.config.queue_capacity = capacity;
        self
    }

    /// Use `appender` as the console sink instead of standard error
    ///
    /// It still only receives records at or above the console threshold, and
    /// only when console output is enabled.
    #[must_use = "builder methods return a new value"]
    pub fn console_appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.console = Some(Box::new(appender));
        self
    }

    /// Run `handler` instead of exiting the process after a FATAL record
    #[must_use = "builder methods return a new value"]
    pub fn on_fatal<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_fatal = Some(Arc::new(handler));
        self
    }

    /// Validate the configuration and build the Logger
    ///
    /// In asynchronous mode this starts the delivery thread.
    pub fn build(self) -> Result<Logger> {
        self.config.validate()?;

        let async_logging = self.config.async_logging;
        let mut logger = Logger::assemble(
            self.config,
            self.console,
            self.on_fatal.unwrap_or_else(default_fatal_handler),
        );
        if async_logging {
            logger.start_worker()?;
        }
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
