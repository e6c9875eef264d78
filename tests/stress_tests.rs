//! Stress tests for concurrent delivery
//!
//! These tests verify:
//! - Every record from k concurrent producers is delivered exactly once
//! - No producer's records are reordered relative to each other
//! - A tiny queue applies backpressure instead of dropping
//! - Synchronous mode never interleaves partial lines in files

use parking_lot::Mutex;
use rust_cascade_logger::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const PRODUCERS: usize = 8;
const RECORDS_PER_PRODUCER: usize = 2_000;

/// Records `(producer, sequence)` for every delivered record
#[derive(Clone, Default)]
struct OrderRecorder {
    seen: Arc<Mutex<Vec<(usize, usize)>>>,
}

impl Appender for OrderRecorder {
    fn append(&mut self, record: &LogRecord, _line: &str) -> Result<()> {
        let args = record.args();
        let producer = args[0].parse().expect("producer id");
        let sequence = args[1].parse().expect("sequence number");
        self.seen.lock().push((producer, sequence));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "order-recorder"
    }
}

fn run_producers(logger: &Arc<Logger>) {
    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let logger = Arc::clone(logger);
            thread::spawn(move || {
                for sequence in 0..RECORDS_PER_PRODUCER {
                    logger.log_args(
                        LogLevel::Info,
                        "producer {} record {}",
                        [producer.to_string(), sequence.to_string()],
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("producer panicked");
    }
}

fn assert_exactly_once_in_order(seen: &[(usize, usize)]) {
    assert_eq!(seen.len(), PRODUCERS * RECORDS_PER_PRODUCER);

    let mut next: HashMap<usize, usize> = HashMap::new();
    for &(producer, sequence) in seen {
        let expected = next.entry(producer).or_insert(0);
        assert_eq!(
            sequence, *expected,
            "producer {} delivered {} when {} was due",
            producer, sequence, expected
        );
        *expected += 1;
    }
    assert!(next.values().all(|&count| count == RECORDS_PER_PRODUCER));
}

#[test]
fn test_async_producers_exactly_once_in_order() {
    let recorder = OrderRecorder::default();
    let logger = Arc::new(
        Logger::builder()
            .config(LoggerConfig::new().with_line_format("{message}"))
            .console_appender(recorder.clone())
            .async_mode(256)
            .build()
            .expect("Failed to build logger"),
    );

    run_producers(&logger);
    logger.shutdown();

    assert_exactly_once_in_order(&recorder.seen.lock());
    assert_eq!(
        logger.metrics().records_emitted(),
        (PRODUCERS * RECORDS_PER_PRODUCER) as u64
    );
}

#[test]
fn test_tiny_queue_blocks_instead_of_dropping() {
    let recorder = OrderRecorder::default();
    let logger = Arc::new(
        Logger::builder()
            .config(LoggerConfig::new().with_line_format("{message}"))
            .console_appender(recorder.clone())
            .async_mode(1)
            .build()
            .expect("Failed to build logger"),
    );

    run_producers(&logger);
    logger.flush().expect("Failed to flush");

    assert_exactly_once_in_order(&recorder.seen.lock());
    assert_eq!(logger.metrics().sink_errors(), 0);
}

#[test]
fn test_sync_producers_exactly_once_in_order() {
    let recorder = OrderRecorder::default();
    let logger = Arc::new(
        Logger::builder()
            .config(LoggerConfig::new().with_line_format("{message}"))
            .console_appender(recorder.clone())
            .build()
            .expect("Failed to build logger"),
    );

    run_producers(&logger);
    assert_exactly_once_in_order(&recorder.seen.lock());
}

#[test]
fn test_concurrent_file_lines_stay_whole() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for async_logging in [false, true] {
        let basename = if async_logging { "async" } else { "sync" };
        let logger = Arc::new(
            Logger::builder()
                .config(
                    LoggerConfig::new()
                        .with_console(false)
                        .with_line_format("{level} {message}")
                        .with_file_output(temp_dir.path(), basename)
                        .with_file_level(LogLevel::Info)
                        .with_async(async_logging),
                )
                .build()
                .expect("Failed to build logger"),
        );

        run_producers(&logger);
        logger.shutdown();

        let content = std::fs::read_to_string(temp_dir.path().join(format!("{}.INFO", basename)))
            .expect("Failed to read log file");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), PRODUCERS * RECORDS_PER_PRODUCER);
        assert!(lines
            .iter()
            .all(|line| line.starts_with("I producer ") && line.split(' ').count() == 5));
    }
}
