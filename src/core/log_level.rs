//! Log level definitions

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a record. Ordering by ordinal drives every threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warning = 3,
    Error = 4,
    Fatal = 5,
}

impl LogLevel {
    /// Number of levels, also the number of per-level files.
    pub const COUNT: usize = 6;

    /// All levels in ascending severity.
    pub const ALL: [LogLevel; LogLevel::COUNT] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Long name, also used as the level file suffix.
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Single-letter code rendered by the `{level}` tag.
    pub fn code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "T",
            LogLevel::Debug => "D",
            LogLevel::Info => "I",
            LogLevel::Warning => "W",
            LogLevel::Error => "E",
            LogLevel::Fatal => "F",
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(LoggerError::invalid_level(s)),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self, LoggerError> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn test_codes_and_names() {
        let codes: Vec<&str> = LogLevel::ALL.iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["T", "D", "I", "W", "E", "F"]);
        assert_eq!(LogLevel::Warning.to_str(), "WARNING");
        assert_eq!(LogLevel::Fatal.index(), 5);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("Warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warning);
    }

    #[test]
    fn test_parse_unknown_is_an_error() {
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel(ref name) if name == "verbose"));
    }

    #[test]
    fn test_try_from_string() {
        assert_eq!(LogLevel::try_from("fatal".to_string()).unwrap(), LogLevel::Fatal);
        assert!(matches!(
            LogLevel::try_from(String::from("loud")),
            Err(LoggerError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_serde_uses_names() {
        let level: LogLevel = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level, LogLevel::Error);
        assert_eq!(serde_json::to_string(&LogLevel::Debug).unwrap(), "\"DEBUG\"");
        assert!(serde_json::from_str::<LogLevel>("\"loud\"").is_err());
    }
}
