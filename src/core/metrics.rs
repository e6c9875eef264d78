//! Logger metrics for observability
//!
//! Counters describing what the logger did with the records it was handed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters
///
/// # Example
///
/// ```
/// use rust_cascade_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_emitted();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.records_emitted(), 1);
/// assert_eq!(metrics.records_filtered(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records written to at least one sink
    records_emitted: AtomicU64,

    /// Records rejected by the level, verbosity or throttle checks
    records_filtered: AtomicU64,

    /// Times a producer waited for space in the delivery queue
    backpressure_waits: AtomicU64,

    /// Failed or panicking sink writes
    sink_errors: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            records_emitted: AtomicU64::new(0),
            records_filtered: AtomicU64::new(0),
            backpressure_waits: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_emitted(&self) -> u64 {
        self.records_emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_filtered(&self) -> u64 {
        self.records_filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backpressure_waits(&self) -> u64 {
        self.backpressure_waits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.records_emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.records_filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_backpressure_wait(&self) -> u64 {
        self.backpressure_waits.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_error(&self) -> u64 {
        self.sink_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.records_emitted.store(0, Ordering::Relaxed);
        self.records_filtered.store(0, Ordering::Relaxed);
        self.backpressure_waits.store(0, Ordering::Relaxed);
        self.sink_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            records_emitted: AtomicU64::new(self.records_emitted()),
            records_filtered: AtomicU64::new(self.records_filtered()),
            backpressure_waits: AtomicU64::new(self.backpressure_waits()),
            sink_errors: AtomicU64::new(self.sink_errors()),
        }
    }
}
