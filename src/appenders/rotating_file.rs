//! Size-rotated file appender with a single backup generation
//!
//! The file is opened lazily on the first write. Before every write the bytes
//! written since the last rotation are compared with the limit; once the limit
//! has been exceeded the file is closed, renamed to `<path>.old` (replacing any
//! previous backup) and a fresh file is opened at the original path.
//!
//! Open, write and rotation failures are reported on standard error once per
//! failure streak. Reopening the file does not end a streak; it ends, with a
//! short recovery note, once a line is written or a rotation succeeds.

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use crate::core::log_record::LogRecord;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Suffix of the rotated backup.
pub const BACKUP_SUFFIX: &str = "old";

/// Rotation settings
///
/// # Examples
///
/// ```
/// use rust_cascade_logger::appenders::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(1024 * 1024)
///     .with_compression(true);
/// assert_eq!(policy.max_size, 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Bytes written before the next write rotates, `0` never rotates
    pub max_size: u64,
    /// Gzip the backup into `<path>.old.gz`
    pub compress: bool,
    /// Keep the content of an existing file on first open
    pub append: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: crate::core::config::DEFAULT_MAX_FILE_SIZE,
            compress: false,
            append: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_size = size;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_append(mut self, enabled: bool) -> Self {
        self.append = enabled;
        self
    }
}

/// File appender that keeps at most one rotated backup
///
/// # Examples
///
/// ```no_run
/// use rust_cascade_logger::appenders::{RotatingFileAppender, RotationPolicy};
///
/// let appender = RotatingFileAppender::new(
///     "/var/log/server.INFO",
///     RotationPolicy::new().with_max_size(10 * 1024 * 1024),
/// );
/// assert!(!appender.is_open());
/// ```
pub struct RotatingFileAppender {
    path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    /// Set after the first open so later opens never truncate
    opened_once: bool,
    /// Inside a failure streak, further failures are not reported
    failing: bool,
    failure_reports: u64,
    rotations: u64,
}

impl RotatingFileAppender {
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            policy,
            writer: None,
            current_size: 0,
            opened_once: false,
            failing: false,
            failure_reports: 0,
            rotations: 0,
        }
    }

    /// Path of the single backup generation
    pub fn backup_path(&self) -> PathBuf {
        append_extension(&self.path, BACKUP_SUFFIX)
    }

    /// Path of the compressed backup
    pub fn compressed_backup_path(&self) -> PathBuf {
        append_extension(&self.backup_path(), "gz")
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Bytes written since the file was opened or last rotated
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Number of completed rotations
    #[must_use]
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// True while a failure streak is in progress
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.failing
    }

    /// Number of failure streaks reported on standard error
    #[must_use]
    pub fn failure_reports(&self) -> u64 {
        self.failure_reports
    }

    /// Write one line, rotating first when the size limit has been exceeded.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        if self.writer.is_none() {
            if let Err(e) = self.open() {
                self.report(&e);
                return Err(e);
            }
        }

        if self.policy.max_size > 0 && self.current_size > self.policy.max_size {
            match self.rotate() {
                Ok(()) => self.recovered(),
                Err(e) => {
                    self.report(&e);
                    self.recover_after_failed_rotation()?;
                }
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;

        let written = writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush());

        match written {
            Ok(()) => {
                self.current_size += line.len() as u64 + 1;
                self.recovered();
                Ok(())
            }
            Err(e) => {
                let err = LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to write log entry: {}", e),
                );
                self.report(&err);
                // Drop the handle so the next write reopens the file
                self.writer = None;
                Err(err)
            }
        }
    }

    /// End a failure streak, if one is in progress.
    fn recovered(&mut self) {
        if self.failing {
            self.failing = false;
            eprintln!(
                "[LOGGER WARNING] Log file {} is writable again.",
                self.path.display()
            );
        }
    }

    /// Report the first failure of a streak.
    fn report(&mut self, err: &LoggerError) {
        if !self.failing {
            self.failing = true;
            self.failure_reports += 1;
            eprintln!(
                "[LOGGER ERROR] {}. Further failures for this file are suppressed until it recovers.",
                err
            );
        }
    }

    fn open(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        // Truncation happens after locking so another owner's file is never clobbered
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;

        lock_exclusive(&file, &self.path)?;

        let keep = self.opened_once || self.policy.append;
        let size = if keep {
            file.metadata()
                .map_err(|e| {
                    LoggerError::file_appender(
                        self.path.display().to_string(),
                        format!("Cannot access file metadata: {}", e),
                    )
                })?
                .len()
        } else {
            file.set_len(0).map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to truncate: {}", e),
                )
            })?;
            0
        };

        let mut writer = BufWriter::new(file);
        seek_to_end(&mut writer, &self.path)?;

        self.writer = Some(writer);
        self.current_size = size;
        self.opened_once = true;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        // Explicitly drop writer to release the file handle before renaming
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let backup = self.backup_path();
        if let Err(e) = fs::rename(&self.path, &backup) {
            // Some platforms refuse to rename over an existing file
            if backup.exists() {
                let _ = fs::remove_file(&backup);
            }
            fs::rename(&self.path, &backup).map_err(|_| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
        }

        if self.policy.compress {
            let compressed = self.compressed_backup_path();
            if let Err(e) = compress_file(&backup, &compressed) {
                // The uncompressed backup is now the only generation
                let _ = fs::remove_file(&compressed);
                return Err(e);
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to create new log file: {}", e),
                )
            })?;
        lock_exclusive(&file, &self.path)?;

        self.writer = Some(BufWriter::new(file));
        self.current_size = 0;
        self.rotations += 1;
        Ok(())
    }

    /// Keep logging into whatever file exists after a failed rotation.
    fn recover_after_failed_rotation(&mut self) -> Result<()> {
        if self.writer.is_none() {
            let reopened = self.open();
            if let Err(e) = reopened {
                self.report(&e);
                return Err(e);
            }
        }
        // Allow the file to grow past the limit rather than retrying on every write
        self.current_size = 0;
        Ok(())
    }
}

impl Appender for RotatingFileAppender {
    fn append(&mut self, _record: &LogRecord, line: &str) -> Result<()> {
        self.write_line(line)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "RotatingFileAppender"
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            // Best effort flush - ignore errors during drop
            let _ = writer.flush();
        }
    }
}

/// `foo.INFO` + `old` -> `foo.INFO.old`
fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn seek_to_end(writer: &mut BufWriter<File>, path: &Path) -> Result<()> {
    use std::io::{Seek, SeekFrom};
    writer.seek(SeekFrom::End(0)).map_err(|e| {
        LoggerError::file_appender(path.display().to_string(), format!("Failed to seek: {}", e))
    })?;
    Ok(())
}

#[cfg(feature = "file")]
fn lock_exclusive(file: &File, path: &Path) -> Result<()> {
    use fs2::FileExt;
    file.try_lock_exclusive()
        .map_err(|_| LoggerError::file_lock(path.display().to_string()))
}

#[cfg(not(feature = "file"))]
fn lock_exclusive(_file: &File, _path: &Path) -> Result<()> {
    Ok(())
}

/// Gzip `source` into `target`, removing `source` only once `target` is complete.
fn compress_file(source: &Path, target: &Path) -> Result<()> {
    use std::io::{BufReader, Read};

    let temp = append_extension(target, "tmp");

    let input = File::open(source).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", source.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let streamed = (|| -> std::io::Result<()> {
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            encoder.write_all(&buffer[..read])?;
        }
        encoder.finish()?.flush()
    })();

    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", source.display()),
            e,
        ));
    }

    fs::rename(&temp, target).map_err(|e| {
        let _ = fs::remove_file(&temp);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", target.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(source) {
        eprintln!(
            "[LOGGER WARNING] Compression succeeded but failed to remove {}: {}",
            source.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn line(i: usize) -> String {
        // 29 bytes + newline
        format!("I message number {:04} xxxxxxx", i)
    }

    #[test]
    fn test_lazy_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.INFO");
        let mut appender = RotatingFileAppender::new(&path, RotationPolicy::new());

        assert!(!appender.is_open());
        assert!(!path.exists());

        appender.write_line("first").unwrap();
        assert!(appender.is_open());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");
        assert_eq!(appender.current_size(), 6);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("app.WARNING");
        let mut appender = RotatingFileAppender::new(&path, RotationPolicy::new());
        appender.write_line("w").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_first_open_truncates_unless_appending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.DEBUG");
        fs::write(&path, "stale\n").unwrap();

        let mut appender = RotatingFileAppender::new(&path, RotationPolicy::new());
        appender.write_line("fresh").unwrap();
        drop(appender);
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");

        let mut appender =
            RotatingFileAppender::new(&path, RotationPolicy::new().with_append(true));
        appender.write_line("more").unwrap();
        assert_eq!(appender.current_size(), 11);
        drop(appender);
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\nmore\n");
    }

    #[test]
    fn test_single_rotation_keeps_pre_rotation_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.INFO");
        let mut appender =
            RotatingFileAppender::new(&path, RotationPolicy::new().with_max_size(100));

        // 4 lines = 120 bytes > 100, the 5th write rotates
        for i in 0..5 {
            appender.write_line(&line(i)).unwrap();
        }

        assert_eq!(appender.rotations(), 1);
        let backup = fs::read_to_string(appender.backup_path()).unwrap();
        let expected: String = (0..4).map(|i| format!("{}\n", line(i))).collect();
        assert_eq!(backup, expected);
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", line(4)));
    }

    #[test]
    fn test_at_most_one_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.ERROR");
        let mut appender =
            RotatingFileAppender::new(&path, RotationPolicy::new().with_max_size(50));

        for i in 0..40 {
            appender.write_line(&line(i)).unwrap();
        }
        assert!(appender.rotations() > 1);

        let files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 2, "unexpected files: {:?}", files);
        assert!(files.contains(&"app.ERROR".to_string()));
        assert!(files.contains(&"app.ERROR.old".to_string()));
    }

    #[test]
    fn test_zero_max_size_never_rotates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.TRACE");
        let mut appender = RotatingFileAppender::new(&path, RotationPolicy::new().with_max_size(0));
        for i in 0..100 {
            appender.write_line(&line(i)).unwrap();
        }
        assert_eq!(appender.rotations(), 0);
        assert!(!appender.backup_path().exists());
    }

    #[test]
    fn test_compressed_backup() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let dir = tempdir().unwrap();
        let path = dir.path().join("app.INFO");
        let mut appender = RotatingFileAppender::new(
            &path,
            RotationPolicy::new().with_max_size(100).with_compression(true),
        );
        for i in 0..5 {
            appender.write_line(&line(i)).unwrap();
        }

        assert!(!appender.backup_path().exists());
        let compressed = fs::File::open(appender.compressed_backup_path()).unwrap();
        let mut content = String::new();
        GzDecoder::new(compressed).read_to_string(&mut content).unwrap();
        assert!(content.starts_with(&line(0)));
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_open_failure_is_reported_once_per_streak() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes every open fail
        let path = dir.path().join("blocked.INFO");
        fs::create_dir(&path).unwrap();

        let mut appender = RotatingFileAppender::new(&path, RotationPolicy::new());
        assert!(appender.write_line("a").is_err());
        assert!(appender.is_failing());
        assert!(appender.write_line("b").is_err());
        assert!(appender.is_failing());

        fs::remove_dir(&path).unwrap();
        appender.write_line("c").unwrap();
        assert!(!appender.is_failing());
        assert_eq!(appender.failure_reports(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "c\n");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_is_reported_once_per_streak() {
        // Opens fine, every write fails with ENOSPC
        let mut appender =
            RotatingFileAppender::new("/dev/full", RotationPolicy::new().with_append(true));

        for _ in 0..3 {
            assert!(appender.write_line("lost").is_err());
            assert!(appender.is_failing());
        }
        assert_eq!(appender.failure_reports(), 1);
    }

    #[test]
    fn test_failed_compression_keeps_single_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.INFO");
        let mut appender = RotatingFileAppender::new(
            &path,
            RotationPolicy::new().with_max_size(100).with_compression(true),
        );
        for i in 0..5 {
            appender.write_line(&line(i)).unwrap();
        }
        assert!(appender.compressed_backup_path().exists());

        // A directory in the way of the temporary archive makes compression fail
        let blocker = append_extension(&appender.compressed_backup_path(), "tmp");
        fs::create_dir(&blocker).unwrap();
        for i in 5..9 {
            appender.write_line(&line(i)).unwrap();
        }
        assert_eq!(appender.rotations(), 1);
        assert_eq!(appender.failure_reports(), 1);
        assert!(!appender.is_failing());

        let mut files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != blocker)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, vec!["app.INFO", "app.INFO.old"]);

        let backup: String = (4..8).map(|i| format!("{}\n", line(i))).collect();
        assert_eq!(fs::read_to_string(appender.backup_path()).unwrap(), backup);
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", line(8)));
    }

    #[cfg(feature = "file")]
    #[test]
    fn test_second_writer_is_locked_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.FATAL");
        let mut first = RotatingFileAppender::new(&path, RotationPolicy::new());
        first.write_line("owner").unwrap();

        let mut second = RotatingFileAppender::new(&path, RotationPolicy::new().with_append(true));
        let err = second.write_line("intruder").unwrap_err();
        assert!(matches!(err, LoggerError::FileLockError { .. }));
        drop(first);
        assert_eq!(fs::read_to_string(&path).unwrap(), "owner\n");
    }

    #[test]
    fn test_backup_path() {
        let appender = RotatingFileAppender::new("/var/log/app.INFO", RotationPolicy::new());
        assert_eq!(appender.backup_path(), PathBuf::from("/var/log/app.INFO.old"));
        assert_eq!(
            appender.compressed_backup_path(),
            PathBuf::from("/var/log/app.INFO.old.gz")
        );
    }
}
