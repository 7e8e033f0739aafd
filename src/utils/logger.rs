//! Logging utilities
//!
//! Diagnostics go through `tracing`; the report itself is printed to stdout.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Level for a `-v` count on top of `base`
    pub fn from_verbosity(base: LogLevel, verbose: u8) -> Self {
        match (base, verbose) {
            (level, 0) => level,
            (LogLevel::Trace, _) | (_, 2..) => LogLevel::Trace,
            (LogLevel::Debug, _) => LogLevel::Trace,
            _ => LogLevel::Debug,
        }
    }

    pub fn filter_directive(self) -> String {
        format!("spears={}", self.to_tracing_level())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tracing_level())
    }
}

/// Initialize the logger with specified level
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::new(level.filter_directive());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
