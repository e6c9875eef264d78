//! Appender implementations

pub mod console;
pub mod level_files;
pub mod rotating_file;

pub use console::{ConsoleAppender, ConsoleTarget};
pub use level_files::LevelFileSet;
pub use rotating_file::{RotatingFileAppender, RotationPolicy};

pub use crate::core::Appender;
