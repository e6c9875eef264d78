//! Core logger types and traits

pub mod appender;
pub mod colors;
pub mod config;
pub mod datetime;
pub mod delivery_queue;
pub mod error;
pub mod format;
pub mod global;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod render;
pub mod scope;
pub mod throttle;

pub use appender::Appender;
pub use config::LoggerConfig;
pub use datetime::DatetimePrecision;
pub use delivery_queue::{DeliveryQueue, Pushed, Stopped};
pub use error::{LoggerError, Result};
pub use global::LoggerGuard;
pub use log_level::LogLevel;
pub use log_record::{LogRecord, SourceLocation};
pub use logger::{FatalHandler, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use render::{LineTemplate, RenderSettings, RenderedLine, Renderer};
pub use scope::{ScopeDepth, ScopeGuard};
pub use throttle::{ThrottleKey, ThrottleRegistry};
